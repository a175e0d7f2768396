//! Server-rendered overview page.

use std::fmt::Write;

use axum::extract::State;
use axum::response::Html;
use intake::db::{contact_repo, stats_repo, ContactRecord, ContactStats};
use intake::PollerStatus;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let contacts = contact_repo::query_contacts(&state.db, None)?;
    let stats = stats_repo::stats(&state.db)?;
    let status = state.poller.status();
    Ok(Html(render(&contacts, &stats, &status)))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Contact Intake</title>
<style>
body { font-family: sans-serif; margin: 2rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: top; }
th { background: #D7E4BC; }
.stats span { margin-right: 2rem; }
</style>
</head>
<body>
<h1>Contact Intake</h1>
"#;

const PAGE_SCRIPT: &str = r#"<script>
async function post(path) {
  const res = await fetch(path, { method: "POST" });
  alert(JSON.stringify(await res.json()));
  location.reload();
}
</script>
</body>
</html>
"#;

fn render(contacts: &[ContactRecord], stats: &ContactStats, status: &PollerStatus) -> String {
    let mut page = String::from(PAGE_HEAD);

    let _ = writeln!(
        page,
        "<p class=\"stats\"><span>Total: {}</span><span>Today: {}</span><span>This week: {}</span></p>",
        stats.total_contacts, stats.today_contacts, stats.week_contacts
    );

    let state = if status.is_processing { "running" } else { "stopped" };
    let last = status.last_processed.as_deref().unwrap_or("never");
    let _ = writeln!(
        page,
        "<p>Polling: <strong>{}</strong> &middot; last processed: {}</p>",
        state,
        escape_html(last)
    );

    page.push_str(concat!(
        "<p>",
        "<button onclick=\"post('/start_processing')\">Start polling</button> ",
        "<button onclick=\"post('/stop_processing')\">Stop polling</button> ",
        "<button onclick=\"post('/import_all')\">Import all</button> ",
        "<a href=\"/export_excel\">Export to Excel</a>",
        "</p>\n",
        "<form action=\"/export_excel\" method=\"get\">",
        "<input name=\"q\" placeholder=\"Search term\"> ",
        "<button type=\"submit\">Export matching</button>",
        "</form>\n",
    ));

    page.push_str("<table>\n<tr><th>Name</th><th>Address</th><th>Postcode</th><th>Skills</th><th>Other</th><th>Sender</th><th>Received</th></tr>\n");
    for record in contacts {
        let c = &record.contact;
        page.push_str("<tr>");
        for value in [
            &c.name,
            &c.address,
            &c.postcode,
            &c.skills,
            &c.other,
            &c.email_sender,
            &c.email_date,
        ] {
            let _ = write!(page, "<td>{}</td>", escape_html(value));
        }
        page.push_str("</tr>\n");
    }
    page.push_str("</table>\n");

    if contacts.is_empty() {
        page.push_str("<p>No contacts yet.</p>\n");
    }

    page.push_str(PAGE_SCRIPT);
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake::ExtractedContact;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_escapes_contact_values() {
        let record = ContactRecord {
            id: 1,
            contact: ExtractedContact {
                name: "<script>alert(1)</script>".to_string(),
                ..ExtractedContact::default()
            },
            created_at: "2024-01-01 00:00:00".to_string(),
        };
        let page = render(&[record], &ContactStats::default(), &PollerStatus::default());
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("Polling: <strong>stopped</strong>"));
        assert!(page.contains("last processed: never"));
    }

    #[test]
    fn test_render_empty_store() {
        let stats = ContactStats {
            total_contacts: 0,
            today_contacts: 0,
            week_contacts: 0,
        };
        let page = render(&[], &stats, &PollerStatus::default());
        assert!(page.contains("No contacts yet."));
        assert!(page.contains("Total: 0"));
    }
}
