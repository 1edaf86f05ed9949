use std::sync::LazyLock;

use minijinja::{context, Environment};

const STATUS_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Subscription Hub</title>
<style>
:root { --bg: #0f172a; --card: #1e293b; --text: #e2e8f0; --accent: #38bdf8; --btn: #0ea5e9; }
body { background: var(--bg); color: var(--text); font-family: sans-serif; display: flex; justify-content: center; align-items: center; min-height: 100vh; margin: 0; }
.card { background: var(--card); padding: 2rem; border-radius: 16px; width: 90%; max-width: 420px; text-align: center; }
h2 { margin-top: 0; color: var(--accent); }
.status { font-size: 13px; color: #94a3b8; margin-bottom: 20px; }
.box { background: rgba(0,0,0,0.3); padding: 12px; border-radius: 8px; margin: 15px 0; word-break: break-all; font-family: monospace; font-size: 12px; user-select: all; }
label { display: block; text-align: left; font-size: 12px; color: #94a3b8; margin-top: 15px; }
select, button { width: 100%; padding: 14px; margin-top: 5px; border-radius: 10px; border: none; font-size: 15px; }
select { background: #334155; color: white; }
button { background: var(--btn); color: white; font-weight: 600; cursor: pointer; }
</style>
</head>
<body>
<div class="card">
    <h2>Subscription Hub</h2>
    <div class="status">Stored nodes: <b id="count">{{ count }}</b> | Store: {{ backend }}</div>
    <label>Subscription URL (Clash / v2rayN)</label>
    <div class="box" id="url">{{ url }}</div>
    <label>Download as</label>
    <select id="fmt">
    {%- for format in formats %}
        <option value="{{ format.value }}">{{ format.label }}</option>
    {%- endfor %}
    </select>
    <button onclick="jump()">Open</button>
</div>
<script>
    function jump() {
        const fmt = document.getElementById('fmt').value;
        window.location.href = window.location.href.split('?')[0] + '?format=' + fmt;
    }
</script>
</body>
</html>
"#;

static STATUS_ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    if let Err(e) = env.add_template("status.html", STATUS_TEMPLATE) {
        log::error!("Failed to compile status page template: {}", e);
    }
    env
});

/// Render the browser status page.
///
/// `url` is the subscription address as requested; its query string is dropped.
pub fn render_status_page(url: &str, count: usize, backend: &str) -> Result<String, minijinja::Error> {
    let base_url = url.split('?').next().unwrap_or(url);
    let formats = vec![
        context! { value => "clash", label => "Clash / OpenClash (YAML)" },
        context! { value => "v2ray", label => "V2Ray (Base64)" },
    ];
    STATUS_ENV.get_template("status.html")?.render(context! {
        url => base_url,
        count => count,
        backend => backend,
        formats => formats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_page_strips_query() {
        let html = render_status_page("http://hub.local/sub?format=clash", 3, "memory").unwrap();
        assert!(html.contains("hub.local"));
        assert!(html.contains("sub</div>"));
        assert!(!html.contains("format=clash"));
        assert!(html.contains(r#"<b id="count">3</b>"#));
        assert!(html.contains(r#"<option value="clash">"#));
        assert!(html.contains(r#"<option value="v2ray">"#));
    }

    #[test]
    fn test_status_page_escapes_url() {
        let html = render_status_page("http://hub.local/sub/<x>", 0, "file").unwrap();
        assert!(html.contains("&lt;x&gt;"));
        assert!(!html.contains("<x>"));
    }
}
