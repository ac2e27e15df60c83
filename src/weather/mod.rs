//! Background data for the clock mode.

#[cfg(feature = "weather")]
pub mod openweather;

use thiserror::Error;

#[cfg(feature = "weather")]
pub use openweather::OpenWeather;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API not configured")]
    NotConfigured,
    #[error("weather request failed: {0}")]
    Http(String),
    #[error("invalid weather response: {0}")]
    Decode(#[from] std::io::Error),
}

/// Current conditions; any field may be missing from a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    /// Whole degrees Celsius.
    pub temperature: Option<i32>,
    /// Provider icon code, e.g. `10d`.
    pub icon: Option<String>,
}

pub trait WeatherSource {
    fn fetch(&mut self) -> Result<Conditions, WeatherError>;
}

impl<W: WeatherSource + ?Sized> WeatherSource for Box<W> {
    fn fetch(&mut self) -> Result<Conditions, WeatherError> {
        (**self).fetch()
    }
}

/// Source used when no weather provider is compiled in or configured.
#[derive(Debug, Default)]
pub struct NoWeather;

impl WeatherSource for NoWeather {
    fn fetch(&mut self) -> Result<Conditions, WeatherError> {
        Err(WeatherError::NotConfigured)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    /// Replays canned results and counts fetches through a shared handle.
    #[derive(Debug, Clone, Default)]
    pub struct CannedWeather {
        pub results: Rc<RefCell<VecDeque<Result<Conditions, WeatherError>>>>,
        pub fetches: Rc<RefCell<usize>>,
    }

    impl CannedWeather {
        pub fn push(&self, result: Result<Conditions, WeatherError>) {
            self.results.borrow_mut().push_back(result);
        }

        pub fn fetch_count(&self) -> usize {
            *self.fetches.borrow()
        }
    }

    impl WeatherSource for CannedWeather {
        fn fetch(&mut self) -> Result<Conditions, WeatherError> {
            *self.fetches.borrow_mut() += 1;
            self.results
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(WeatherError::NotConfigured))
        }
    }
}
