use crate::capture::monitor::{MonitorRect, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An independently tracked input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Cursor,
    LeftStick,
    RightStick,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Cursor, Channel::LeftStick, Channel::RightStick];

    /// Thumbstick channels record into a fixed square instead of a monitor
    pub fn is_radial(&self) -> bool {
        matches!(self, Channel::LeftStick | Channel::RightStick)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Cursor => write!(f, "cursor"),
            Channel::LeftStick => write!(f, "left-stick"),
            Channel::RightStick => write!(f, "right-stick"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Middle, MouseButton::Right];
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Middle => write!(f, "middle"),
            MouseButton::Right => write!(f, "right"),
        }
    }
}

/// A family of arrays within a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dataset {
    /// Movement tracks of one channel
    Movement(Channel),
    /// Press locations of one mouse button
    Clicks(MouseButton),
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Movement(channel) => write!(f, "{}", channel),
            Dataset::Clicks(button) => write!(f, "clicks-{}", button),
        }
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Channel::ALL
            .iter()
            .map(|c| Dataset::Movement(*c))
            .chain(MouseButton::ALL.iter().map(|b| Dataset::Clicks(*b)))
            .find(|d| d.to_string() == wanted)
            .ok_or_else(|| format!("unknown dataset '{}'", s))
    }
}

/// One polled or event-driven position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub channel: Channel,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub timestamp_tick: u64,
}

impl PositionSample {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One button press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickSample {
    pub button: MouseButton,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub timestamp_tick: u64,
}

impl ClickSample {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Everything the capture layer can tell the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
    Position(PositionSample),
    Click(ClickSample),
    MonitorTopologyChanged {
        logical: Vec<MonitorRect>,
        physical: Vec<MonitorRect>,
    },
    /// Foreground application changed; subsequent samples go to `profile`
    ProfileChanged { profile: String },
    /// Drop all data of `profile` and return its channels to idle
    ResetProfile { profile: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_names_round_trip() {
        for dataset in [
            Dataset::Movement(Channel::Cursor),
            Dataset::Movement(Channel::RightStick),
            Dataset::Clicks(MouseButton::Middle),
        ] {
            assert_eq!(dataset.to_string().parse::<Dataset>(), Ok(dataset));
        }
        assert!("keyboard".parse::<Dataset>().is_err());
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"[
            {"type": "monitorTopologyChanged",
             "logical": [{"x1": 0, "y1": 0, "x2": 10, "y2": 10}],
             "physical": [{"x1": 0, "y1": 0, "x2": 10, "y2": 10}]},
            {"type": "position", "channel": "cursor", "x": 3, "y": 4},
            {"type": "click", "button": "left", "x": 3, "y": 4, "timestampTick": 7},
            {"type": "profileChanged", "profile": "game.exe"}
        ]"#;
        let events: Vec<TrackerEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[1],
            TrackerEvent::Position(PositionSample {
                channel: Channel::Cursor,
                x: 3,
                y: 4,
                timestamp_tick: 0,
            })
        );
        assert!(matches!(events[2], TrackerEvent::Click(ClickSample { timestamp_tick: 7, .. })));
    }
}
