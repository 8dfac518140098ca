use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

const BUFFERED_PREFIX: &str = "buffered_";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Workload {
    #[default]
    LargeFile,
    IncrementalFile,
    SmallFiles,
}

impl Workload {
    pub const ALL: [Workload; 3] = [
        Workload::LargeFile,
        Workload::IncrementalFile,
        Workload::SmallFiles,
    ];

    /// Prefix of the mode names the workload generator accepts
    pub fn prefix(&self) -> &'static str {
        match self {
            Workload::LargeFile => "",
            Workload::IncrementalFile => "incremental_",
            Workload::SmallFiles => "small_",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Workload::LargeFile => "large-file",
            Workload::IncrementalFile => "incremental-file",
            Workload::SmallFiles => "small-files",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    #[default]
    Read,
    Write,
    Update,
}

impl Op {
    pub const ALL: [Op; 3] = [Op::Read, Op::Write, Op::Update];

    pub fn label(&self) -> &'static str {
        match self {
            Op::Read => "read",
            Op::Write => "write",
            Op::Update => "update",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    Inorder,
    Reversed,
    Random,
}

impl Order {
    pub const ALL: [Order; 3] = [Order::Inorder, Order::Reversed, Order::Random];

    pub fn label(&self) -> &'static str {
        match self {
            Order::Inorder => "inorder",
            Order::Reversed => "reversed",
            Order::Random => "random",
        }
    }
}

/// One access pattern of the workload generator, e.g. `buffered_read_random`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mode {
    pub workload: Workload,
    pub buffered: bool,
    pub op: Op,
    pub order: Order,
}

impl Mode {
    pub fn new(workload: Workload, buffered: bool, op: Op, order: Order) -> Self {
        Self {
            workload,
            buffered,
            op,
            order,
        }
    }

    pub fn with_buffered(self, buffered: bool) -> Self {
        Self { buffered, ..self }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}_{}",
            self.workload.prefix(),
            if self.buffered { BUFFERED_PREFIX } else { "" },
            self.op.label(),
            self.order.label()
        )
    }
}

impl FromStr for Mode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::InvalidMode(s.to_owned());

        // large-file has the empty prefix, so it has to be tried last
        let (workload, rest) = Workload::ALL
            .iter()
            .rev()
            .find_map(|w| s.strip_prefix(w.prefix()).map(|rest| (*w, rest)))
            .ok_or_else(invalid)?;
        let (buffered, rest) = match rest.strip_prefix(BUFFERED_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let (op, order) = rest.split_once('_').ok_or_else(invalid)?;
        let op = Op::ALL
            .into_iter()
            .find(|x| x.label() == op)
            .ok_or_else(invalid)?;
        let order = Order::ALL
            .into_iter()
            .find(|x| x.label() == order)
            .ok_or_else(invalid)?;
        Ok(Mode::new(workload, buffered, op, order))
    }
}

impl TryFrom<String> for Mode {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(value: Mode) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_spelling_back() {
        for workload in Workload::ALL {
            for buffered in [false, true] {
                for op in Op::ALL {
                    for order in Order::ALL {
                        let mode = Mode::new(workload, buffered, op, order);
                        assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
                    }
                }
            }
        }
    }

    #[test]
    fn known_names() {
        let mode: Mode = "buffered_update_reversed".parse().unwrap();
        assert_eq!(
            mode,
            Mode::new(Workload::LargeFile, true, Op::Update, Order::Reversed)
        );
        let mode: Mode = "incremental_read_random".parse().unwrap();
        assert_eq!(mode.workload, Workload::IncrementalFile);
        assert!(!mode.buffered);
        assert_eq!(
            Mode::new(Workload::SmallFiles, false, Op::Write, Order::Inorder).to_string(),
            "small_write_inorder"
        );
    }

    #[test]
    fn rejects_unknown_names() {
        for name in ["", "read", "read_sideways", "append_inorder", "buffered_"] {
            assert!(name.parse::<Mode>().is_err(), "{name}");
        }
    }

    #[test]
    fn serializes_as_string() {
        let mode: Mode = serde_json::from_str("\"write_inorder\"").unwrap();
        assert_eq!(serde_json::to_string(&mode).unwrap(), "\"write_inorder\"");
        assert!(serde_json::from_str::<Mode>("\"write_later\"").is_err());
    }
}
