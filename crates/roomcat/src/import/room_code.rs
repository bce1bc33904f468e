//! Parsing of compact room codes such as `M209`.
//!
//! A code is `<building><floor digit><two-digit number>`, read from the right:
//! the last two characters are the room number, the one before them the
//! floor, everything else the building code.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A room code split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoomCode {
    pub building: String,
    pub floor: i64,
    pub number: i64,
}

/// Why a room code could not be split.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RoomCodeError {
    #[error("room code '{code}' is shorter than 3 characters")]
    TooShort { code: String },

    #[error("room code '{code}' has no building prefix")]
    EmptyBuilding { code: String },

    #[error("room code '{code}' has non-digit floor '{floor}'")]
    InvalidFloor { code: String, floor: char },

    #[error("room code '{code}' has non-numeric room number '{number}'")]
    InvalidNumber { code: String, number: String },
}

/// Splits a compact room code into building, floor and number.
///
/// ```
/// use roomcat::import::parse_room_code;
///
/// let code = parse_room_code("ABC305").unwrap();
/// assert_eq!((code.building.as_str(), code.floor, code.number), ("ABC", 3, 5));
/// ```
pub fn parse_room_code(code: &str) -> Result<RoomCode, RoomCodeError> {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() < 3 {
        return Err(RoomCodeError::TooShort {
            code: code.to_string(),
        });
    }

    let split = chars.len() - 3;
    let building: String = chars[..split].iter().collect();
    let floor_char = chars[split];
    let number: String = chars[split + 1..].iter().collect();

    if building.is_empty() {
        return Err(RoomCodeError::EmptyBuilding {
            code: code.to_string(),
        });
    }

    let floor = floor_char
        .to_digit(10)
        .ok_or_else(|| RoomCodeError::InvalidFloor {
            code: code.to_string(),
            floor: floor_char,
        })?;

    let number_value = number
        .chars()
        .try_fold(0i64, |acc, c| c.to_digit(10).map(|d| acc * 10 + i64::from(d)))
        .ok_or_else(|| RoomCodeError::InvalidNumber {
            code: code.to_string(),
            number: number.clone(),
        })?;

    Ok(RoomCode {
        building,
        floor: i64::from(floor),
        number: number_value,
    })
}

impl FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_room_code(s)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{:02}", self.building, self.floor, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_letter_building() {
        let code = parse_room_code("M209").unwrap();
        assert_eq!(
            code,
            RoomCode {
                building: "M".to_string(),
                floor: 2,
                number: 9,
            }
        );
    }

    #[test]
    fn test_parse_multi_letter_building() {
        let code: RoomCode = "ABC305".parse().unwrap();
        assert_eq!(code.building, "ABC");
        assert_eq!(code.floor, 3);
        assert_eq!(code.number, 5);
        assert_eq!(code.to_string(), "ABC305");
    }

    #[test]
    fn test_too_short() {
        for input in ["", "M", "09"] {
            assert!(matches!(
                parse_room_code(input),
                Err(RoomCodeError::TooShort { .. })
            ));
        }
    }

    #[test]
    fn test_missing_building() {
        assert!(matches!(
            parse_room_code("209"),
            Err(RoomCodeError::EmptyBuilding { .. })
        ));
    }

    #[test]
    fn test_non_digit_positions() {
        assert!(matches!(
            parse_room_code("MX09"),
            Err(RoomCodeError::InvalidFloor { floor: 'X', .. })
        ));
        assert!(matches!(
            parse_room_code("M2A9"),
            Err(RoomCodeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_room_code("M2+9"),
            Err(RoomCodeError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_multibyte_building_code() {
        let code = parse_room_code("Ö110").unwrap();
        assert_eq!(code.building, "Ö");
        assert_eq!(code.floor, 1);
        assert_eq!(code.number, 10);
    }
}
