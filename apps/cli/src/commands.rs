use anyhow::{bail, Result};
use client_core::{EventdeskClient, Notification, NotificationLevel};
use shared::{
    domain::{Event, EventId},
    protocol::{EventPayload, ListEventsParams, LoginRequest, RegisterRequest},
    validation::{self, FieldError},
};
use tokio::sync::broadcast;

use crate::{Command, EventForm, EventsCommand, ValidateCommand};

impl EventForm {
    fn into_payload(self) -> EventPayload {
        EventPayload {
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
        }
    }
}

pub(crate) async fn run(client: &EventdeskClient, command: Command) -> Result<()> {
    let mut notifications = client.subscribe_notifications();

    match command {
        Command::Register {
            email,
            password,
            name,
            role,
        } => {
            let request = RegisterRequest {
                name,
                email,
                password,
                role,
            };
            reject_invalid(validation::validate_registration(&request))?;
            client.auth().register_user(&request).await;
            print_notifications(&mut notifications);
            require(client.auth().is_authenticated(), "registration failed")
        }
        Command::Login { email, password } => {
            let request = LoginRequest { email, password };
            reject_invalid(validation::validate_login(&request))?;
            client.auth().login_user(&request).await;
            print_notifications(&mut notifications);
            require(client.auth().is_authenticated(), "login failed")
        }
        Command::Logout => {
            client.auth().logout().await;
            print_notifications(&mut notifications);
            Ok(())
        }
        Command::Me => {
            if client.auth().token().is_none() {
                bail!("not logged in");
            }
            client.auth().fetch_current_user().await;
            print_notifications(&mut notifications);
            match client.auth().user() {
                Some(user) => {
                    println!(
                        "{} <{}> role={} id={}",
                        user.name,
                        user.email,
                        user.role.as_str(),
                        user.id
                    );
                    Ok(())
                }
                None => bail!("session is no longer valid"),
            }
        }
        Command::Events(events) => {
            let result = run_events(client, events).await;
            print_notifications(&mut notifications);
            result
        }
        Command::Validate(ValidateCommand::Event(form)) => validate_event(&form),
    }
}

async fn run_events(client: &EventdeskClient, command: EventsCommand) -> Result<()> {
    let store = client.events();
    match command {
        EventsCommand::List {
            page,
            limit,
            search,
            sort,
        } => {
            store
                .fetch_events(&ListEventsParams {
                    page,
                    limit,
                    search,
                    sort,
                })
                .await;
            let state = store.snapshot();
            if let Some(message) = state.error {
                bail!(message);
            }
            for event in &state.events {
                print_event(event);
            }
            if let Some(meta) = state.meta {
                println!("{}", serde_json::to_string(&meta)?);
            }
        }
        EventsCommand::Create(form) => {
            let payload = form.into_payload();
            reject_invalid(validation::validate_event_today(&payload))?;
            store.add_event(&payload).await;
            if let Some(message) = store.error() {
                bail!(message);
            }
            if let Some(created) = store.events().first() {
                print_event(created);
            }
        }
        EventsCommand::Update { id, form } => {
            let payload = form.into_payload();
            reject_invalid(validation::validate_event_today(&payload))?;
            store.update_event(&EventId::new(id), &payload).await;
            if let Some(message) = store.error() {
                bail!(message);
            }
        }
        EventsCommand::Delete { id } => {
            store.delete_event(&EventId::new(id)).await;
            if let Some(message) = store.error() {
                bail!(message);
            }
        }
    }
    Ok(())
}

pub(crate) fn validate_event(form: &EventForm) -> Result<()> {
    let payload = form.clone().into_payload();
    reject_invalid(validation::validate_event_today(&payload))?;
    println!("event form is valid");
    Ok(())
}

fn reject_invalid(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for error in &errors {
        eprintln!("{error}");
    }
    bail!("{} field(s) failed validation", errors.len())
}

fn require(ok: bool, what: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        bail!("{what}")
    }
}

fn print_event(event: &Event) {
    println!(
        "{}  {}  {} @ {}",
        event.id, event.date, event.title, event.location
    );
}

fn print_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        match notification.level {
            NotificationLevel::Error => {
                eprintln!("[{}] {}", notification.level, notification.message)
            }
            _ => println!("[{}] {}", notification.level, notification.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_event_form_is_rejected_locally() {
        let form = EventForm {
            title: "TS".into(),
            description: "short".into(),
            date: "not-a-date".into(),
            location: "Room 4".into(),
        };
        let err = validate_event(&form).expect_err("invalid form");
        assert_eq!(err.to_string(), "3 field(s) failed validation");
    }

    #[test]
    fn event_form_maps_onto_payload() {
        let form = EventForm {
            title: "Team Sync".into(),
            description: "Weekly planning session".into(),
            date: "2031-03-04".into(),
            location: "Room 4".into(),
        };
        let payload = form.into_payload();
        assert_eq!(payload.title, "Team Sync");
        assert_eq!(payload.date, "2031-03-04");
    }
}
