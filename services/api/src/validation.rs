//! Input validation utilities

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::geo;
use crate::models::GeoPoint;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate display name
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();

    if trimmed.len() < 2 {
        return Err("Name must be at least 2 characters long".to_string());
    }

    if trimmed.len() > 64 {
        return Err("Name must be at most 64 characters long".to_string());
    }

    Ok(())
}

/// Validate event title
pub fn validate_event_title(title: &str) -> Result<(), String> {
    let len = title.trim().chars().count();

    if len < 3 {
        return Err("Title must be at least 3 characters long".to_string());
    }

    if len > 100 {
        return Err("Title must be at most 100 characters long".to_string());
    }

    Ok(())
}

/// Validate event description
pub fn validate_event_description(description: &str) -> Result<(), String> {
    if description.chars().count() > 500 {
        return Err("Description must be at most 500 characters long".to_string());
    }

    Ok(())
}

/// Validate the attendee capacity, bounded to small in-person meetups
pub fn validate_attendee_limit(limit: i32) -> Result<(), String> {
    if !(5..=100).contains(&limit) {
        return Err("Attendee limit must be between 5 and 100".to_string());
    }

    Ok(())
}

/// Validate the event location against the Germany bounding box
pub fn validate_event_location(location: GeoPoint) -> Result<(), String> {
    if !geo::is_in_germany(location.lat, location.lng) {
        return Err("Event must be located in Germany".to_string());
    }

    Ok(())
}

/// Validate event timing: at least one hour of lead time, end after start
pub fn validate_event_times(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<(), String> {
    if start_time <= Utc::now() + Duration::hours(1) {
        return Err("Event must start at least 1 hour in the future".to_string());
    }

    if end_time <= start_time {
        return Err("End time must be after start time".to_string());
    }

    Ok(())
}

/// Validate chat message content
pub fn validate_message_content(content: &str) -> Result<(), String> {
    if content.is_empty() {
        return Err("Message content is required".to_string());
    }

    if content.chars().count() > 500 {
        return Err("Message must be at most 500 characters long".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_emails() {
        assert!(validate_email("anna@example.de").is_ok());
        assert!(validate_email("a.b+c@sub.example.com").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("anna@").is_err());
        assert!(validate_email("@example.de").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn name_length_bounds() {
        assert!(validate_name("A").is_err());
        assert!(validate_name("  A  ").is_err());
        assert!(validate_name("An").is_ok());
    }

    #[test]
    fn title_length_bounds() {
        assert!(validate_event_title("Pu").is_err());
        assert!(validate_event_title("Pudding im Park").is_ok());
        assert!(validate_event_title(&"x".repeat(101)).is_err());
    }

    #[test]
    fn attendee_limit_bounds() {
        assert!(validate_attendee_limit(4).is_err());
        assert!(validate_attendee_limit(5).is_ok());
        assert!(validate_attendee_limit(100).is_ok());
        assert!(validate_attendee_limit(101).is_err());
    }

    #[test]
    fn location_outside_germany_is_rejected() {
        assert!(validate_event_location(GeoPoint { lat: 40.0, lng: 0.0 }).is_err());
        assert!(validate_event_location(GeoPoint {
            lat: 52.52,
            lng: 13.405
        })
        .is_ok());
    }

    #[test]
    fn events_need_an_hour_of_lead_time() {
        let now = Utc::now();
        let soon = now + Duration::minutes(30);
        let later = now + Duration::hours(2);

        assert!(validate_event_times(soon, soon + Duration::hours(1)).is_err());
        assert!(validate_event_times(later, later + Duration::hours(1)).is_ok());
    }

    #[test]
    fn events_must_end_after_they_start() {
        let start = Utc::now() + Duration::hours(3);
        assert!(validate_event_times(start, start).is_err());
        assert!(validate_event_times(start, start - Duration::minutes(1)).is_err());
    }

    #[test]
    fn message_content_bounds() {
        assert!(validate_message_content("").is_err());
        assert!(validate_message_content("Hallo!").is_ok());
        assert!(validate_message_content(&"x".repeat(500)).is_ok());
        assert!(validate_message_content(&"x".repeat(501)).is_err());
    }
}
