use crate::errors::ValidationError;
use crate::models::{SubjectForm, SubjectRecord};
use crate::state::ViewState;

/// Renders the tracker page. `draft` and `errors` carry a rejected submission
/// back into the form.
pub fn render_index(
    view: &ViewState,
    draft: Option<&SubjectForm>,
    errors: Option<&ValidationError>,
) -> String {
    let form = match view.editing.as_deref() {
        Some(key) => {
            let values = draft.cloned().or_else(|| {
                view.subjects
                    .iter()
                    .find(|record| record.subject_name == key)
                    .map(SubjectForm::from_record)
            });
            render_form(Some(key), &values.unwrap_or_default(), errors)
        }
        None => render_form(None, &draft.cloned().unwrap_or_default(), errors),
    };

    let cards = if view.subjects.is_empty() {
        r#"<p class="empty">No subjects yet. Add one below.</p>"#.to_string()
    } else {
        view.subjects.iter().map(render_card).collect::<Vec<_>>().join("\n")
    };

    INDEX_HTML
        .replace("{{SUMMARY}}", &render_summary(&view.subjects))
        .replace("{{SUBJECTS}}", &cards)
        .replace("{{FORM}}", &form)
}

fn render_summary(subjects: &[SubjectRecord]) -> String {
    let attended: u64 = subjects.iter().map(|r| u64::from(r.lecture_attended)).sum();
    let total: u64 = subjects.iter().map(|r| u64::from(r.total_lectures)).sum();
    format!(
        r#"<span class="label">Overall</span><span class="value">{attended}/{total}</span>"#
    )
}

fn render_card(record: &SubjectRecord) -> String {
    let name = escape_html(&record.subject_name);
    let base = format!("/subjects/{}", urlencoding::encode(&record.subject_name));
    format!(
        r#"<article class="subject">
  <header>
    <strong>{name}</strong>
    <span>{attended}/{total}</span>
    <span class="pct">{pct}%</span>
  </header>
  <div class="row">
    <form method="post" action="{base}/attended"><button class="btn-add" type="submit">+ Attended</button></form>
    <form method="post" action="{base}/skipped"><button class="btn-sub" type="submit">- Skipped</button></form>
  </div>
  <div class="row minor">
    <form method="post" action="{base}/edit"><button class="link" type="submit">Edit</button></form>
    <form method="post" action="{base}/delete"><button class="link danger" type="submit">Delete</button></form>
  </div>
</article>"#,
        attended = record.lecture_attended,
        total = record.total_lectures,
        pct = record.percentage,
    )
}

fn render_form(editing: Option<&str>, values: &SubjectForm, errors: Option<&ValidationError>) -> String {
    let error_for = |field: &str| {
        errors
            .and_then(|errors| errors.message_for(field))
            .map(|message| format!(r#"<span class="error">{}</span>"#, escape_html(message)))
            .unwrap_or_default()
    };

    let (title, action, name_attrs, cancel) = match editing {
        Some(key) => (
            format!("Edit {}", escape_html(key)),
            format!("/subjects/{}", urlencoding::encode(key)),
            format!(r#"value="{}" readonly"#, escape_html(key)),
            r#"<form method="post" action="/edit/cancel"><button class="link" type="submit">Cancel</button></form>"#,
        ),
        None => (
            "Add subject".to_string(),
            "/subjects".to_string(),
            format!(r#"value="{}""#, escape_html(&values.subject_name)),
            "",
        ),
    };

    format!(
        r#"<section class="form-card">
  <h2>{title}</h2>
  <form method="post" action="{action}">
    <input type="text" name="subjectName" placeholder="Subject Name" {name_attrs} />
    {name_error}
    <input type="number" name="lectureAttended" placeholder="Lectures Attended" min="0" value="{attended}" />
    {attended_error}
    <input type="number" name="totalLectures" placeholder="Total Lectures Done" min="0" value="{total}" />
    {total_error}
    <button class="btn-add" type="submit">Save Subject</button>
  </form>
  {cancel}
</section>"#,
        name_error = error_for("subjectName"),
        attended = escape_html(&values.lecture_attended),
        attended_error = error_for("lectureAttended"),
        total = escape_html(&values.total_lectures),
        total_error = error_for("totalLectures"),
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Attendance Tracker</title>
  <style>
    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 18px 40px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    .summary {
      display: flex;
      gap: 12px;
      align-items: baseline;
    }

    .summary .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .summary .value {
      font-size: 1.4rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
      gap: 16px;
    }

    .subject, .form-card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 18px;
      display: grid;
      gap: 12px;
    }

    .subject header {
      display: flex;
      justify-content: space-between;
      gap: 8px;
    }

    .subject .pct {
      color: var(--accent);
      font-weight: 600;
    }

    .row {
      display: flex;
      gap: 8px;
    }

    .row form {
      flex: 1;
    }

    .form-card form {
      display: grid;
      gap: 10px;
    }

    input {
      border: 1px solid rgba(47, 72, 88, 0.2);
      border-radius: 12px;
      padding: 10px 12px;
      font-size: 1rem;
    }

    input[readonly] {
      background: #f1ede6;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 14px;
      font-size: 0.95rem;
      font-weight: 600;
      cursor: pointer;
      width: 100%;
    }

    .btn-add {
      background: var(--accent);
      color: white;
    }

    .btn-sub {
      background: var(--accent-2);
      color: white;
    }

    .link {
      background: transparent;
      color: var(--accent-2);
    }

    .danger {
      color: #b3261e;
    }

    .error {
      color: #b3261e;
      font-size: 0.85rem;
    }

    .empty {
      color: #5f5c57;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Attendance Tracker</h1>
    <div class="summary">{{SUMMARY}}</div>
    <section class="grid">
{{SUBJECTS}}
    </section>
{{FORM}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_cards_with_percentages() {
        let view = ViewState {
            subjects: vec![SubjectRecord::new("DBMS", 7, 10)],
            editing: None,
        };
        let html = render_index(&view, None, None);
        assert!(html.contains("<strong>DBMS</strong>"));
        assert!(html.contains("7/10"));
        assert!(html.contains("70.00%"));
        assert!(html.contains(r#"action="/subjects/DBMS/attended""#));
        assert!(html.contains("Add subject"));
    }

    #[test]
    fn edit_mode_locks_the_name() {
        let view = ViewState {
            subjects: vec![SubjectRecord::new("OS", 1, 3)],
            editing: Some("OS".to_string()),
        };
        let html = render_index(&view, None, None);
        assert!(html.contains(r#"value="OS" readonly"#));
        assert!(html.contains(r#"action="/subjects/OS""#));
        assert!(html.contains(r#"name="totalLectures" placeholder="Total Lectures Done" min="0" value="3""#));
    }

    #[test]
    fn shows_field_errors_and_escapes_input() {
        let mut errors = ValidationError::default();
        errors.push("subjectName", "Use short form");
        let draft = SubjectForm::new("<b>x</b>", "1", "2");
        let html = render_index(&ViewState::default(), Some(&draft), Some(&errors));
        assert!(html.contains(r#"<span class="error">Use short form</span>"#));
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!html.contains("<b>x</b>"));
    }
}
