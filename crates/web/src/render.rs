//! HTML pages.

use std::fmt::Write;

use ideavote_core::{MAX_VOTES_PER_QUARTER, QuarterBallot};
use ideavote_db::entities::idea;

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:56rem;margin:0 auto;padding:2rem 1rem;color:#0f172a}\
.card{border:1px solid #cbd5e1;border-radius:1rem;padding:1.25rem;margin:1rem 0}\
.pill{display:inline-block;border:1px solid #94a3b8;border-radius:999px;padding:0 .5rem;font-size:.8rem}\
.ok{color:#047857}.err{color:#be123c}.muted{color:#475569}\
input,textarea{display:block;width:100%;box-sizing:border-box;margin:.4rem 0;padding:.5rem}\
form.inline{display:inline}button.active{font-weight:700;text-decoration:underline}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        html_escape(title)
    )
}

/// Flags shown on the sign-in page.
#[derive(Debug, Clone, Default)]
pub struct HomeView<'a> {
    /// A sign-in link was just sent.
    pub sent: bool,
    /// The last email was outside the allowed domain.
    pub denied: bool,
    /// Sign-in error to show.
    pub error: Option<&'a str>,
    /// Domain named in the sign-in hint.
    pub allowed_domain: Option<&'a str>,
}

/// Sign-in page.
#[must_use]
pub fn home_page(view: &HomeView<'_>) -> String {
    let mut body = String::new();
    body.push_str("<header>\n<h1>Vote on the questions we solve next.</h1>\n");
    let _ = writeln!(
        body,
        "<p>Everyone gets <b>{MAX_VOTES_PER_QUARTER} votes</b> per quarter. Stack or split.</p>\n</header>"
    );

    body.push_str("<main class=\"card\">\n<h2>Sign in</h2>\n");
    match view.allowed_domain {
        Some(domain) => {
            let _ = writeln!(
                body,
                "<p class=\"muted\">We'll email you a one-time sign-in link (@{} addresses only).</p>",
                html_escape(domain)
            );
        }
        None => body.push_str("<p class=\"muted\">We'll email you a one-time sign-in link.</p>\n"),
    }
    body.push_str(
        "<form action=\"/auth/signin\" method=\"post\">\n\
         <input type=\"email\" name=\"email\" placeholder=\"you@example.com\" required>\n\
         <button type=\"submit\">Email me a sign-in link</button>\n</form>\n\
         <form action=\"/auth/oauth\" method=\"post\">\n\
         <button type=\"submit\">Continue with single sign-on</button>\n</form>\n",
    );

    if view.sent {
        body.push_str("<p class=\"ok\">Check your email for the sign-in link.</p>\n");
    }
    if view.denied {
        body.push_str("<p class=\"err\">This app is restricted to the allowed email domain.</p>\n");
    }
    if let Some(error) = view.error {
        let _ = writeln!(body, "<p class=\"err\">Sign-in error: {}</p>", html_escape(error));
    }
    body.push_str("</main>\n");

    layout("Sign in", &body)
}

/// Everything shown on the voting page.
#[derive(Debug, Clone)]
pub struct LabView<'a> {
    /// Signed-in user's email.
    pub email: &'a str,
    /// Quarter being shown.
    pub quarter: &'a str,
    /// Ideas of the quarter, newest first.
    pub ideas: &'a [idea::Model],
    /// Totals and the user's own allocation.
    pub ballot: &'a QuarterBallot,
    /// Idea form error (`err` parameter).
    pub error: Option<&'a str>,
    /// Vote error (`vote_err` parameter).
    pub vote_error: Option<&'a str>,
}

fn idea_error_message(error: &str) -> String {
    if error == "missing" {
        "Title, description and quarter are required.".to_string()
    } else {
        format!("Could not add idea: {}", html_escape(error))
    }
}

fn vote_buttons(body: &mut String, idea_id: &str, quarter: &str, mine: i32) {
    for votes in 0..=MAX_VOTES_PER_QUARTER {
        let class = if votes == mine { " class=\"active\"" } else { "" };
        let _ = writeln!(
            body,
            "<form class=\"inline\" action=\"/vote\" method=\"post\">\
             <input type=\"hidden\" name=\"ideaId\" value=\"{}\">\
             <input type=\"hidden\" name=\"quarter\" value=\"{}\">\
             <input type=\"hidden\" name=\"votes\" value=\"{votes}\">\
             <button type=\"submit\"{class}>{votes}</button></form>",
            html_escape(idea_id),
            html_escape(quarter),
        );
    }
}

fn idea_card(body: &mut String, idea: &idea::Model, ballot: &QuarterBallot) {
    body.push_str("<article class=\"card\">\n");
    let _ = writeln!(
        body,
        "<span class=\"pill\">{}</span>\n<h3>{}</h3>",
        html_escape(&idea.category),
        html_escape(&idea.title)
    );
    if let Some(description) = &idea.description {
        let _ = writeln!(
            body,
            "<p style=\"white-space:pre-wrap\">{}</p>",
            html_escape(description)
        );
    }
    if let Some(data_gaps) = &idea.data_gaps {
        let _ = writeln!(
            body,
            "<p class=\"muted\">Data gaps: {}</p>",
            html_escape(data_gaps)
        );
    }

    let mine = ballot.mine_for(&idea.id);
    let _ = writeln!(
        body,
        "<p>Total votes: <b>{}</b> &middot; Your votes: <b>{mine}</b></p>",
        ballot.total_for(&idea.id)
    );
    vote_buttons(body, &idea.id, &idea.quarter, mine);
    body.push_str("</article>\n");
}

/// Voting page for one quarter.
#[must_use]
pub fn lab_page(view: &LabView<'_>) -> String {
    let quarter = html_escape(view.quarter);
    let mut body = String::new();

    let _ = writeln!(
        body,
        "<header>\n<span class=\"pill\">Voting console &middot; {quarter}</span>\n<h1>Ideas</h1>"
    );
    let _ = writeln!(
        body,
        "<p>Everyone gets <b>{MAX_VOTES_PER_QUARTER} votes</b> per quarter. You have used <b>{}</b>, <b>{}</b> remaining.</p>",
        view.ballot.used, view.ballot.remaining
    );
    let _ = writeln!(
        body,
        "<p class=\"muted\">Signed in as {}</p>\n\
         <form action=\"/auth/signout\" method=\"post\"><button type=\"submit\">Sign out</button></form>\n</header>",
        html_escape(view.email)
    );

    body.push_str("<section class=\"card\">\n<h2>Add an idea</h2>\n");
    if let Some(error) = view.error {
        let _ = writeln!(body, "<p class=\"err\">{}</p>", idea_error_message(error));
    }
    let _ = writeln!(
        body,
        "<form action=\"/idea\" method=\"post\">\n\
         <input type=\"hidden\" name=\"quarter\" value=\"{quarter}\">\n\
         <input name=\"title\" placeholder=\"Title\" required>\n\
         <input name=\"category\" placeholder=\"Category (default: Other)\">\n\
         <textarea name=\"description\" rows=\"5\" placeholder=\"Details and questions to answer\" required></textarea>\n\
         <textarea name=\"data_gaps\" rows=\"3\" placeholder=\"Known data gaps (optional)\"></textarea>\n\
         <button type=\"submit\">Add idea</button>\n</form>\n</section>"
    );

    body.push_str("<section>\n");
    if let Some(error) = view.vote_error {
        let _ = writeln!(
            body,
            "<p class=\"err\">Vote not saved: {}</p>",
            html_escape(error)
        );
    }
    if view.ideas.is_empty() {
        let _ = writeln!(
            body,
            "<p class=\"card muted\">No ideas yet for {quarter}. Add the first one.</p>"
        );
    }
    for idea in view.ideas {
        idea_card(&mut body, idea, view.ballot);
    }
    body.push_str("</section>\n");

    layout(&format!("Ideas {}", view.quarter), &body)
}
