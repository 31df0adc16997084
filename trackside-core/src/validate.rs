use crate::sport::PeriodStructure;
use core::time::Duration;
use thiserror::Error;

const MAX_NAME_LEN: usize = 40;
const MAX_LABEL_LEN: usize = 60;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("Opponent name cannot be empty")]
    EmptyName,
    #[error("Opponent name cannot be longer than {MAX_NAME_LEN} characters")]
    NameTooLong,
    #[error("Event label cannot be empty")]
    EmptyLabel,
    #[error("Event label cannot be longer than {MAX_LABEL_LEN} characters")]
    LabelTooLong,
    #[error("Text cannot contain control characters")]
    ControlChars,
    #[error("Game time cannot exceed the period length of {0:?}")]
    TimeTooLong(Duration),
}

pub type ValidateResult<T> = std::result::Result<T, ValidateError>;

/// Trims and checks an opponent name entered at the settings form.
pub fn validate_opponent_name(input: &str) -> ValidateResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidateError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidateError::NameTooLong);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidateError::ControlChars);
    }
    Ok(trimmed.to_string())
}

/// Trims and checks a user-supplied event label.
pub fn validate_event_label(input: &str) -> ValidateResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidateError::EmptyLabel);
    }
    if trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(ValidateError::LabelTooLong);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidateError::ControlChars);
    }
    Ok(trimmed.to_string())
}

/// Checks a manually entered clock value against the sport's period length.
pub fn validate_game_time(time: Duration, rules: &PeriodStructure) -> ValidateResult<Duration> {
    if time > rules.period_duration {
        Err(ValidateError::TimeTooLong(rules.period_duration))
    } else {
        Ok(time)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sport::Sport;

    #[test]
    fn test_opponent_name_trimmed() {
        assert_eq!(
            validate_opponent_name("  Team B  "),
            Ok("Team B".to_string())
        );
    }

    #[test]
    fn test_opponent_name_rejects_empty() {
        assert_eq!(validate_opponent_name(""), Err(ValidateError::EmptyName));
        assert_eq!(validate_opponent_name("   "), Err(ValidateError::EmptyName));
    }

    #[test]
    fn test_opponent_name_limits() {
        let long = "x".repeat(41);
        assert_eq!(validate_opponent_name(&long), Err(ValidateError::NameTooLong));
        assert_eq!(
            validate_opponent_name("Tab\there"),
            Err(ValidateError::ControlChars)
        );
    }

    #[test]
    fn test_event_label() {
        assert_eq!(
            validate_event_label(" Free kick "),
            Ok("Free kick".to_string())
        );
        assert_eq!(validate_event_label(" "), Err(ValidateError::EmptyLabel));
        let long = "y".repeat(61);
        assert_eq!(
            validate_event_label(&long),
            Err(ValidateError::LabelTooLong)
        );
    }

    #[test]
    fn test_game_time() {
        let rules = Sport::Hockey.period_structure();
        assert_eq!(
            validate_game_time(Duration::from_secs(600), &rules),
            Ok(Duration::from_secs(600))
        );
        assert_eq!(
            validate_game_time(Duration::from_secs(1201), &rules),
            Err(ValidateError::TimeTooLong(Duration::from_secs(1200)))
        );
    }
}
