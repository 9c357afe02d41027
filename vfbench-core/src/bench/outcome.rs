//! Outcome of a single matcher run.
//!
//! Serialized as the checkpoint records consumed by downstream analysis:
//!
//! ```json
//! {"success": 1, "num_sol": 12, "first_solution_time": 0.01, "running_time": 0.4}
//! {"success": 0, "error_info": "Timeout"}
//! ```

use serde::{Deserialize, Serialize};

/// `error_info` marker for runs that exceeded the wall-clock bound.
pub const TIMEOUT_MARKER: &str = "Timeout";

/// Result of one matcher invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOutcome", into = "RawOutcome")]
pub enum Outcome {
    Success {
        num_sol: u64,
        first_solution_time: f64,
        running_time: f64,
    },
    Failure {
        error_info: String,
    },
}

impl Outcome {
    pub fn failure(error_info: impl Into<String>) -> Self {
        Outcome::Failure {
            error_info: error_info.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::failure(TIMEOUT_MARKER)
    }

    /// Failure caused by the driver itself (spawn or wait error).
    ///
    /// Kept distinct from [`TIMEOUT_MARKER`] so it never triggers a cascade skip.
    pub fn driver_error(err: impl std::fmt::Display) -> Self {
        Self::failure(format!("Driver error: {}", err))
    }

    /// Classify the first stdout line of a run that exited with status 0.
    pub fn from_matcher_output(first_line: &str) -> Self {
        match parse_matcher_line(first_line) {
            Some((num_sol, first_solution_time, running_time)) => Outcome::Success {
                num_sol,
                first_solution_time,
                running_time,
            },
            None => Self::failure(format!("Unparseable output: {}", first_line.trim())),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Outcome::Failure { error_info } if error_info == TIMEOUT_MARKER)
    }

    pub fn error_info(&self) -> Option<&str> {
        match self {
            Outcome::Failure { error_info } => Some(error_info),
            Outcome::Success { .. } => None,
        }
    }

    pub fn running_time(&self) -> Option<f64> {
        match self {
            Outcome::Success { running_time, .. } => Some(*running_time),
            Outcome::Failure { .. } => None,
        }
    }
}

/// Parse `<num_sol> <first_solution_time> ... <running_time>`.
///
/// The solution count is the first token and must be an integer. The two
/// times are the second and the last finite numeric tokens of the line;
/// `nan` and `inf` do not count as times.
pub fn parse_matcher_line(line: &str) -> Option<(u64, f64, f64)> {
    let mut tokens = line.split_whitespace();
    let num_sol = tokens.next()?.parse::<u64>().ok()?;
    let times: Vec<f64> = tokens
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|t| t.is_finite())
        .collect();
    if times.len() < 2 {
        return None;
    }
    Some((num_sol, times[0], times[times.len() - 1]))
}

/// Flat record as stored on disk.
#[derive(Serialize, Deserialize)]
struct RawOutcome {
    success: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    num_sol: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_solution_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    running_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_info: Option<String>,
}

impl From<Outcome> for RawOutcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success {
                num_sol,
                first_solution_time,
                running_time,
            } => RawOutcome {
                success: 1,
                num_sol: Some(num_sol),
                first_solution_time: Some(first_solution_time),
                running_time: Some(running_time),
                error_info: None,
            },
            Outcome::Failure { error_info } => RawOutcome {
                success: 0,
                num_sol: None,
                first_solution_time: None,
                running_time: None,
                error_info: Some(error_info),
            },
        }
    }
}

impl TryFrom<RawOutcome> for Outcome {
    type Error = String;

    fn try_from(raw: RawOutcome) -> Result<Self, Self::Error> {
        match raw.success {
            1 => match (raw.num_sol, raw.first_solution_time, raw.running_time) {
                (Some(num_sol), Some(first_solution_time), Some(running_time)) => {
                    Ok(Outcome::Success {
                        num_sol,
                        first_solution_time,
                        running_time,
                    })
                }
                _ => Err("success record is missing num_sol or timing fields".to_string()),
            },
            0 => Ok(Outcome::Failure {
                error_info: raw.error_info.unwrap_or_default(),
            }),
            other => Err(format!("invalid success flag {}", other)),
        }
    }
}
