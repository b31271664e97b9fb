use super::*;

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn password_messages(password: &str) -> Vec<&'static str> {
    validate_login(&login("ada@example.com", password))
        .into_iter()
        .map(|err| err.message)
        .collect()
}

fn event(title: &str, description: &str, date: &str, location: &str) -> EventPayload {
    EventPayload {
        title: title.to_string(),
        description: description.to_string(),
        date: date.to_string(),
        location: location.to_string(),
    }
}

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 15).expect("date")
}

#[test]
fn accepts_password_meeting_every_rule() {
    assert!(password_messages("Passw0rd!").is_empty());
    assert!(password_messages("Zz9(abcd").is_empty());
    let longest = format!("Aa1!{}", "x".repeat(60));
    assert_eq!(longest.chars().count(), 64);
    assert!(password_messages(&longest).is_empty());
}

#[test]
fn each_single_password_violation_reports_only_its_message() {
    let cases = [
        ("Pa0!", MSG_PASSWORD_TOO_SHORT),
        ("passw0rd!", MSG_PASSWORD_UPPERCASE),
        ("PASSW0RD!", MSG_PASSWORD_LOWERCASE),
        ("Password!", MSG_PASSWORD_NUMBER),
        ("Passw0rd1", MSG_PASSWORD_SPECIAL),
    ];
    for (password, expected) in cases {
        assert_eq!(password_messages(password), vec![expected], "password {password}");
    }

    let too_long = format!("Aa1!{}", "a".repeat(61));
    assert_eq!(password_messages(&too_long), vec![MSG_PASSWORD_TOO_LONG]);
}

#[test]
fn reports_multiple_password_violations_together() {
    let messages = password_messages("abc");
    assert_eq!(
        messages,
        vec![
            MSG_PASSWORD_TOO_SHORT,
            MSG_PASSWORD_UPPERCASE,
            MSG_PASSWORD_NUMBER,
            MSG_PASSWORD_SPECIAL,
        ]
    );
}

#[test]
fn special_characters_outside_the_fixed_set_do_not_count() {
    assert_eq!(password_messages("Passw0rd?"), vec![MSG_PASSWORD_SPECIAL]);
}

#[test]
fn email_syntax() {
    for valid in [
        "ada@example.com",
        "first.last+tag@mail.example.co.uk",
        "O'Brien_1@Example.ORG",
    ] {
        assert!(is_valid_email(valid), "{valid} should pass");
    }
    for invalid in [
        "",
        "ada",
        "ada@",
        "ada@example",
        "ada@example.c",
        ".ada@example.com",
        "a..b@example.com",
        "ada.@example.com",
        "ada@-example.com",
        "ada @example.com",
        " ada@example.com ",
        "ada@example.com\n",
    ] {
        assert!(!is_valid_email(invalid), "{invalid} should fail");
    }
}

#[test]
fn registration_checks_email_and_password_but_not_optional_fields() {
    let request = RegisterRequest {
        name: None,
        email: "not-an-email".to_string(),
        password: "Passw0rd!".to_string(),
        role: None,
    };
    assert_eq!(
        validate_registration(&request),
        vec![FieldError {
            field: "email",
            message: MSG_INVALID_EMAIL,
        }]
    );
}

#[test]
fn event_dated_today_passes() {
    let payload = event("Team Sync", "Weekly planning session", "2030-06-15", "Room 4");
    assert!(validate_event(&payload, fixed_today()).is_empty());

    let with_time = event("Team Sync", "Weekly planning session", "2030-06-15T08:00", "Room 4");
    assert!(validate_event(&with_time, fixed_today()).is_empty());
}

#[test]
fn event_dated_before_today_fails() {
    for date in ["2030-06-14", "2030-06-14T23:59:59", "1999-01-01"] {
        let payload = event("Team Sync", "Weekly planning session", date, "Room 4");
        assert_eq!(
            validate_event(&payload, fixed_today()),
            vec![FieldError {
                field: "date",
                message: MSG_DATE_IN_PAST,
            }],
            "date {date}"
        );
    }
}

#[test]
fn unparsable_event_date_reports_format_error_only() {
    for date in ["", "tomorrow", "2030-13-01", "15/06/2030"] {
        let payload = event("Team Sync", "Weekly planning session", date, "Room 4");
        assert_eq!(
            validate_event(&payload, fixed_today()),
            vec![FieldError {
                field: "date",
                message: MSG_INVALID_DATE,
            }],
            "date {date:?}"
        );
    }
}

#[test]
fn rfc3339_future_instant_is_accepted() {
    let payload = event(
        "Team Sync",
        "Weekly planning session",
        "2030-06-20T10:00:00Z",
        "Room 4",
    );
    assert!(validate_event(&payload, fixed_today()).is_empty());
}

#[test]
fn short_event_fields_are_all_reported() {
    let payload = event("Hi", "too short", "2030-07-01", "R4");
    let fields: Vec<_> = validate_event(&payload, fixed_today())
        .into_iter()
        .map(|err| (err.field, err.message))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("title", MSG_TITLE_TOO_SHORT),
            ("description", MSG_DESCRIPTION_TOO_SHORT),
            ("location", MSG_LOCATION_TOO_SHORT),
        ]
    );
}

#[test]
fn lengths_count_characters_not_bytes() {
    let payload = event("Été", "Réunion à Zürich", "2030-07-01", "Köln");
    assert!(validate_event(&payload, fixed_today()).is_empty());
}

#[test]
fn today_variant_accepts_current_day() {
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let payload = event("Team Sync", "Weekly planning session", &today, "Room 4");
    assert!(validate_event_today(&payload).is_empty());
}

#[test]
fn login_rejects_email_with_surrounding_whitespace() {
    let errors = validate_login(&login(" ada@example.com ", "Passw0rd!"));
    assert_eq!(errors, vec![FieldError::new("email", MSG_INVALID_EMAIL)]);
}
