use crate::models::{Clip, Composer, Route};

/// Escape text for inclusion in HTML content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Popup body for a route: composer name in its color, years, label and,
/// when the route has a clip, an audio player.
pub fn route_popup_html(composer: &Composer, route: &Route, clip: Option<&Clip>, color: &str) -> String {
    let mut html = String::with_capacity(512);
    html.push_str(r#"<div class="composer-popup">"#);
    html.push_str(&format!(
        r#"<strong style="color:{}">{}</strong><br />"#,
        escape_html(color),
        escape_html(&composer.name)
    ));
    html.push_str(&format!(
        "<span>{}</span><br />",
        escape_html(route.years.as_deref().unwrap_or_default())
    ));
    html.push_str(&format!(
        r#"<div class="route-label">{}</div>"#,
        escape_html(&route.label)
    ));
    if let Some(clip) = clip {
        html.push_str(&format!(
            "<div><em>{}</em> ({})</div>",
            escape_html(&clip.title),
            escape_html(&clip.year)
        ));
        html.push_str(&format!(
            r#"<audio controls preload="none"><source src="{}" type="audio/mpeg" /></audio>"#,
            escape_html(&clip.url)
        ));
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> Composer {
        Composer {
            name: "Clara <Schumann>".into(),
            ..Composer::default()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_popup_without_clip_has_no_audio() {
        let route = Route {
            label: "Tour to Paris".into(),
            years: Some("1832".into()),
            ..Route::default()
        };
        let html = route_popup_html(&composer(), &route, None, "#e6194b");
        assert!(html.contains("color:#e6194b"));
        assert!(html.contains("Clara &lt;Schumann&gt;"));
        assert!(html.contains("<span>1832</span>"));
        assert!(html.contains("Tour to Paris"));
        assert!(!html.contains("<audio"));
    }

    #[test]
    fn test_popup_with_clip_embeds_audio() {
        let clip = Clip {
            title: "Romance".into(),
            year: "1853".into(),
            url: "audio/romance.mp3".into(),
        };
        let html = route_popup_html(&composer(), &Route::default(), Some(&clip), "#000");
        assert!(html.contains("<em>Romance</em> (1853)"));
        assert!(html.contains(r#"src="audio/romance.mp3""#));
        assert!(html.contains("<span></span>"));
    }
}
