use smallvec::SmallVec;

/// Command arguments; most commands carry three words or fewer.
pub type Args = SmallVec<[String; 4]>;

/// A whitespace-tokenised command line: a verb plus positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: String,
    pub args: Args,
}

impl Command {
    /// `None` for a line with no words.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let verb = words.next()?;
        Some(Self {
            verb,
            args: words.collect(),
        })
    }
}

/// Direction for mode cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// What a command resolves to, given the current dispatcher state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// `next_mode` / `prev_mode`.
    CycleMode(Direction),
    /// `off` / `clear`.
    SwitchOff,
    /// `mode ...` or `<active mode name> ...`.
    CommandActive(Args),
    /// `<registered mode name> ...`: switch, then command.
    SwitchTo { index: usize, args: Args },
    /// Nothing matched; logged and dropped.
    Unknown(String),
}
