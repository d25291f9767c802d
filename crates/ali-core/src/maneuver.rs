//! Clearance commands, candidate solutions and detected conflicts
//!
//! A command is a closed variant over heading, altitude and speed; every
//! rendering (natural language for the judge, wire text for the simulator)
//! is a pure function of its kind.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{AliError, Result};

/// Which aircraft parameter a command changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Heading,
    Altitude,
    Speed,
}

impl CommandKind {
    /// Simulator mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CommandKind::Heading => "HDG",
            CommandKind::Altitude => "ALT",
            CommandKind::Speed => "SPD",
        }
    }

    /// Unit suffix used in natural-language renderings
    pub fn unit(&self) -> &'static str {
        match self {
            CommandKind::Heading => "deg",
            CommandKind::Altitude => "m",
            CommandKind::Speed => "m/s",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Heading => write!(f, "heading"),
            CommandKind::Altitude => write!(f, "altitude"),
            CommandKind::Speed => write!(f, "speed"),
        }
    }
}

/// A clearance to send to one aircraft
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    /// Execution time in whole seconds of simulation time
    pub time: u64,
    /// Target heading, altitude or speed
    pub value: i64,
}

impl Command {
    pub fn new(kind: CommandKind, time: u64, value: i64) -> Self {
        Self { kind, time, value }
    }

    pub fn heading(time: u64, value: i64) -> Self {
        Self::new(CommandKind::Heading, time, value)
    }

    pub fn altitude(time: u64, value: i64) -> Self {
        Self::new(CommandKind::Altitude, time, value)
    }

    pub fn speed(time: u64, value: i64) -> Self {
        Self::new(CommandKind::Speed, time, value)
    }

    /// Build from a real-valued target, truncating toward zero
    pub fn from_real(kind: CommandKind, time: u64, value: f64) -> Self {
        Self::new(kind, time, value.trunc() as i64)
    }

    /// `Change heading to 90deg`
    pub fn natural_command(&self) -> String {
        format!("Change {} to {}{}", self.kind, self.value, self.kind.unit())
    }

    /// `HDG KL204, 90`
    pub fn wire_command(&self, callsign: &str) -> String {
        format!("{} {}, {}", self.kind.mnemonic(), callsign, self.value)
    }

    /// `SCHEDULE 0:01:30, HDG KL204, 90`
    pub fn scheduled_command(&self, callsign: &str) -> String {
        format!(
            "SCHEDULE {}, {}",
            format_clock(self.time),
            self.wire_command(callsign)
        )
    }

    /// Object shown to the judge
    pub fn to_prompt_json(&self) -> Value {
        json!({
            "time": format_clock(self.time),
            "value": self.value,
            "command": self.natural_command(),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.natural_command(), format_clock(self.time))
    }
}

/// Render seconds as `H:MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

/// A candidate maneuver: commands addressed to one aircraft
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Solution {
    pub callsign: String,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Solution {
    pub fn new(callsign: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            callsign: callsign.into(),
            commands,
        }
    }

    /// Commands as the JSON list embedded in judge prompts
    pub fn commands_to_json(&self) -> Value {
        Value::Array(self.commands.iter().map(Command::to_prompt_json).collect())
    }

    /// Commands as an indented JSON block for prompts
    pub fn commands_prompt_block(&self) -> String {
        to_indented_json(&self.commands_to_json())
    }

    /// Multi-line rendering for operator logs
    pub fn pretty_print(&self) -> String {
        let commands: Vec<Value> = self
            .commands
            .iter()
            .map(|c| json!({"time": format_clock(c.time), "command": c.natural_command()}))
            .collect();
        to_indented_json(&json!({"callsign": self.callsign, "commands": commands}))
    }

    /// Simulator stack lines scheduling every command of this solution
    pub fn scheduled_commands(&self) -> Result<Vec<String>> {
        if self.callsign.trim().is_empty() {
            return Err(AliError::invalid_input(
                "a solution needs a callsign before it can be executed",
            ));
        }
        Ok(self
            .commands
            .iter()
            .map(|c| c.scheduled_command(&self.callsign))
            .collect())
    }

    /// Execution time of the first listed command
    pub fn first_command_time(&self) -> Option<u64> {
        self.commands.first().map(|c| c.time)
    }

    /// Whether any command changes the given parameter
    pub fn touches(&self, kind: CommandKind) -> bool {
        self.commands.iter().any(|c| c.kind == kind)
    }
}

fn to_indented_json(value: &Value) -> String {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_default(),
        Err(_) => value.to_string(),
    }
}

/// Unordered pair of aircraft callsigns
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[String; 2]", into = "[String; 2]")]
pub struct CallsignPair {
    first: String,
    second: String,
}

impl CallsignPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn contains(&self, callsign: &str) -> bool {
        self.first == callsign || self.second == callsign
    }

    pub fn as_tuple(&self) -> (&str, &str) {
        (&self.first, &self.second)
    }
}

impl From<[String; 2]> for CallsignPair {
    fn from([a, b]: [String; 2]) -> Self {
        Self::new(a, b)
    }
}

impl From<CallsignPair> for [String; 2] {
    fn from(pair: CallsignPair) -> Self {
        [pair.first, pair.second]
    }
}

impl fmt::Display for CallsignPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.first, self.second)
    }
}

/// A predicted loss of separation between two aircraft
///
/// Identity is the callsign pair alone; the closest-point-of-approach
/// metrics change every tick and never take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub callsigns: CallsignPair,
    /// Horizontal distance at closest point of approach
    #[serde(default)]
    pub dcpa: f64,
    /// Time to closest point of approach, seconds
    #[serde(default)]
    pub tcpa: f64,
}

impl Conflict {
    pub fn new(a: impl Into<String>, b: impl Into<String>, dcpa: f64, tcpa: f64) -> Self {
        Self {
            callsigns: CallsignPair::new(a, b),
            dcpa,
            tcpa,
        }
    }
}

impl PartialEq for Conflict {
    fn eq(&self, other: &Self) -> bool {
        self.callsigns == other.callsigns
    }
}

impl Eq for Conflict {}

impl Hash for Conflict {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.callsigns.hash(state);
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.callsigns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_natural_and_wire_renderings() {
        let hdg = Command::heading(30, 135);
        assert_eq!(hdg.natural_command(), "Change heading to 135deg");
        assert_eq!(hdg.wire_command("KL204"), "HDG KL204, 135");

        assert_eq!(Command::altitude(0, 5000).natural_command(), "Change altitude to 5000m");
        assert_eq!(Command::speed(0, 210).wire_command("AF11"), "SPD AF11, 210");
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(format_clock(0), "0:00:00");
        assert_eq!(format_clock(1000), "0:16:40");
        assert_eq!(format_clock(3723), "1:02:03");
    }

    #[test]
    fn test_from_real_truncates() {
        assert_eq!(Command::from_real(CommandKind::Speed, 10, 187.96).value, 187);
        assert_eq!(Command::from_real(CommandKind::Heading, 10, -12.7).value, -12);
    }

    #[test]
    fn test_prompt_json_shape() {
        let solution = Solution::new("ABC123", vec![Command::altitude(1000, 5000)]);
        assert_eq!(
            solution.commands_to_json(),
            json!([{"time": "0:16:40", "value": 5000, "command": "Change altitude to 5000m"}])
        );
        assert!(solution.commands_prompt_block().contains("\n    {"));
    }

    #[test]
    fn test_scheduled_commands_require_callsign() {
        let solution = Solution::new(
            "KL204",
            vec![Command::heading(90, 45), Command::heading(330, 0)],
        );
        assert_eq!(
            solution.scheduled_commands().unwrap(),
            vec![
                "SCHEDULE 0:01:30, HDG KL204, 45".to_string(),
                "SCHEDULE 0:05:30, HDG KL204, 0".to_string(),
            ]
        );

        let anonymous = Solution::new("", vec![Command::heading(90, 45)]);
        assert!(matches!(
            anonymous.scheduled_commands(),
            Err(AliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_first_command_is_list_order() {
        let solution = Solution::new(
            "KL204",
            vec![Command::speed(300, 200), Command::speed(100, 180)],
        );
        assert_eq!(solution.first_command_time(), Some(300));
        assert_eq!(Solution::default().first_command_time(), None);
    }

    #[test]
    fn test_conflict_identity_ignores_order_and_metrics() {
        let a = Conflict::new("KL204", "AF11", 1200.0, 90.0);
        let b = Conflict::new("AF11", "KL204", 300.0, 12.0);
        assert_eq!(a, b);

        let set: HashSet<Conflict> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);

        assert_ne!(
            Conflict::new("KL204", "AF11", 0.0, 0.0),
            Conflict::new("KL204", "BA7", 0.0, 0.0)
        );
    }

    #[test]
    fn test_conflict_deserializes_from_pair() {
        let conflict: Conflict =
            serde_json::from_str(r#"{"callsigns": ["ZZ1", "AA9"], "dcpa": 4.5, "tcpa": 60}"#)
                .unwrap();
        assert_eq!(conflict.callsigns.as_tuple(), ("AA9", "ZZ1"));
        assert_eq!(conflict.to_string(), "{AA9, ZZ1}");
        assert_eq!(conflict.tcpa, 60.0);
    }

    #[test]
    fn test_solution_deserializes_commands() {
        let solution: Solution = serde_json::from_str(
            r#"{"callsign": "KL204", "commands": [{"kind": "heading", "time": 30, "value": 90}]}"#,
        )
        .unwrap();
        assert!(solution.touches(CommandKind::Heading));
        assert!(!solution.touches(CommandKind::Altitude));
    }
}
