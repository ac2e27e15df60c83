use std::collections::HashMap;

use super::mode::{Mode, ModeSlot};

/// The ordered set of modes, built once at startup.
///
/// Order is the `next_mode` cycling order; names are unique.
#[derive(Default)]
pub struct ModeRegistry {
    slots: Vec<ModeSlot>,
    by_name: HashMap<&'static str, usize>,
}

impl ModeRegistry {
    pub fn new(modes: impl IntoIterator<Item = Box<dyn Mode>>) -> Self {
        let mut registry = Self::default();

        for mode in modes {
            let name = mode.name();
            if registry.by_name.contains_key(name) {
                tracing::warn!(mode = name, "duplicate mode name, keeping the first");
                continue;
            }
            registry.by_name.insert(name, registry.slots.len());
            registry.slots.push(ModeSlot::new(mode));
        }

        registry
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&ModeSlot> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ModeSlot> {
        self.slots.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModeSlot> {
        self.slots.iter_mut()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.slots.iter().map(ModeSlot::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Mode for Named {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn keeps_order_and_indexes_names() {
        let registry = ModeRegistry::new([
            Box::new(Named("display")) as Box<dyn Mode>,
            Box::new(Named("time")),
        ]);
        assert_eq!(registry.names(), vec!["display", "time"]);
        assert_eq!(registry.index_of("time"), Some(1));
        assert_eq!(registry.index_of("draw"), None);
    }

    #[test]
    fn duplicate_names_keep_the_first() {
        let registry = ModeRegistry::new([
            Box::new(Named("time")) as Box<dyn Mode>,
            Box::new(Named("display")),
            Box::new(Named("time")),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.index_of("time"), Some(0));
    }
}
