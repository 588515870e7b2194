use std::fmt::Display;
use std::sync::Arc;

use crate::utils;

#[derive(Clone, Debug, PartialEq)]
pub enum Leg {
    Wait {
        stop_name: Arc<str>,
        /// Minutes.
        time: f64,
    },
    Ride {
        bus: Arc<str>,
        span_count: u32,
        /// Minutes on board, without the wait.
        time: f64,
    },
}

/// Answer to a route query: alternating waits and rides, in travel order.
#[derive(Clone, Debug, PartialEq)]
pub struct Journey {
    pub legs: Vec<Leg>,
    pub total_time: f64,
}

impl Journey {
    pub fn empty() -> Self {
        Self { legs: Vec::new(), total_time: 0.0 }
    }

    pub fn from(legs: Vec<Leg>, total_time: f64) -> Self {
        Self { legs, total_time }
    }

    pub fn num_rides(&self) -> usize {
        self.legs.iter().filter(|leg| matches!(leg, Leg::Ride { .. })).count()
    }
}

impl Display for Journey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-----------------------------------------------")?;
        if !self.legs.is_empty() {
            for leg in self.legs.iter() {
                writeln!(f)?;
                match leg {
                    Leg::Wait { stop_name, time } => {
                        write!(f, "Wait at {} for {}.", stop_name, utils::get_time_str(*time))?;
                    }
                    Leg::Ride { bus, span_count, time } => {
                        write!(f, "Ride bus {} for {} stops ({}).", bus, span_count, utils::get_time_str(*time))?;
                    }
                }
            }
            writeln!(f)?;
        } else {
            writeln!(f)?;
            writeln!(f, "Already there.")?;
        }
        writeln!(f, "Total journey time: {:.2} minutes.", self.total_time)?;
        writeln!(f, "-----------------------------------------------")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let journey = Journey::from(
            vec![
                Leg::Wait { stop_name: Arc::from("A"), time: 6.0 },
                Leg::Ride { bus: Arc::from("1"), span_count: 1, time: 1.5 },
            ],
            7.5,
        );
        let text = journey.to_string();
        assert!(text.contains("Wait at A for 00:06:00."));
        assert!(text.contains("Ride bus 1 for 1 stops (00:01:30)."));
        assert!(text.contains("Total journey time: 7.50 minutes."));
        assert_eq!(journey.num_rides(), 1);
    }

    #[test]
    fn empty_journey() {
        let journey = Journey::empty();
        assert_eq!(journey.num_rides(), 0);
        assert!(journey.to_string().contains("Already there."));
    }
}
