use client_core::{
    controller::{FeedbackTone, NotificationLevel, ViewState},
    deck::Card,
    gesture::CardTransform,
    DeckSession,
};

pub fn card(card: &Card) -> String {
    let posting = &card.posting;
    let mut out = format!("[{}] {}", posting.id, posting.title);
    if let Some(company) = &posting.company {
        out.push_str(&format!(" @ {company}"));
    }
    if let Some(location) = &posting.location {
        out.push_str(&format!(" ({location})"));
    }
    if posting.remote {
        out.push_str(" remote");
    }
    if !posting.tags.is_empty() {
        out.push_str(&format!(" #{}", posting.tags.join(" #")));
    }
    if let Some(fit) = &card.fit {
        out.push_str(&format!("\n    fit {}/10: {}", fit.score, fit.summary));
    }
    out
}

pub fn transform(transform: CardTransform) -> String {
    format!(
        "translateX({:.0}px) rotate({:.1}deg)",
        transform.translate_x, transform.rotate_deg
    )
}

pub fn session(session: &mut DeckSession) -> String {
    let mut lines = Vec::new();
    let controller = session.controller();
    match controller.view() {
        ViewState::Loading => lines.push("loading job feed...".to_string()),
        ViewState::Unauthenticated => {
            lines.push("not signed in: pass --token or set JOBFEED_TOKEN".to_string())
        }
        ViewState::SupplyFailed(message) => {
            lines.push(format!("could not load jobs: {message} (type `refresh` to retry)"))
        }
        ViewState::Empty => {
            lines.push("no more jobs right now (type `refresh` to check again)".to_string())
        }
        ViewState::Ready => {
            if let Some(current) = controller.current_card() {
                lines.push(card(current));
            }
        }
    }

    if let Some(feedback) = controller.feedback() {
        let marker = match feedback.tone {
            FeedbackTone::Accepted => "+",
            FeedbackTone::Declined => "-",
            FeedbackTone::Failed => "!",
        };
        lines.push(format!("{marker} {}", feedback.text));
    }
    if controller.in_flight_count() > 0 {
        lines.push(format!("{} decision(s) saving...", controller.in_flight_count()));
    }

    for notification in session.controller_mut().take_notifications() {
        let level = match notification.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warn",
            NotificationLevel::Error => "error",
        };
        lines.push(format!("[{level}] {}", notification.message));
    }
    lines.join("\n")
}
