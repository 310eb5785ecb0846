use crate::models::preferences::DisplayPreferences;

use super::flash::Flash;
use super::render::escape_html;

/// Signed-in pages reachable from the side menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPage {
    Home,
    Mood,
    Settings,
}

const NAV_ITEMS: &[(NavPage, &str, &str)] = &[
    (NavPage::Home, "/home", "Home"),
    (NavPage::Mood, "/mood", "Mood Tracker"),
    (NavPage::Settings, "/settings", "Settings"),
];

pub struct Shell<'a> {
    pub title: &'a str,
    pub prefs: DisplayPreferences,
    pub flash: Option<&'a Flash>,
    /// `None` for the signed-out pages, which have no menu.
    pub nav: Option<NavPage>,
}

pub fn page(shell: &Shell<'_>, main: &str) -> String {
    let flash = shell.flash.map(Flash::render).unwrap_or_default();
    let menu = shell.nav.map(side_menu).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-theme="{theme}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} | Daily Journal</title>
  <link rel="stylesheet" href="/static/style.css">
</head>
<body class="{font}">
{menu}
<main class="container">
{flash}
{main}
</main>
<script src="/static/journal.js" defer></script>
</body>
</html>
"#,
        theme = shell.prefs.theme.as_str(),
        title = escape_html(shell.title),
        font = shell.prefs.font_size.body_class(),
        menu = menu,
        flash = flash,
        main = main,
    )
}

fn side_menu(active: NavPage) -> String {
    let links: String = NAV_ITEMS
        .iter()
        .map(|(page, href, label)| {
            let class = if *page == active { " class=\"active\"" } else { "" };
            format!(r#"<li><a href="{}"{}>{}</a></li>"#, href, class, label)
        })
        .collect();
    format!(
        r#"<header class="top-bar">
  <details class="side-menu">
    <summary class="hamburger" aria-label="Menu">&#9776;</summary>
    <nav>
      <ul>{links}</ul>
      <form method="post" action="/logout"><button type="submit" class="btn-link">Log Out</button></form>
    </nav>
  </details>
  <span class="brand">Daily Journal</span>
</header>"#,
        links = links
    )
}
