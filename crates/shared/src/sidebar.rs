//! Sidebar state and the row models the frontend renders.

use std::collections::HashSet;

use crate::geo;
use crate::layers::palette_color;
use crate::models::{Composer, EntityStore, Route, Studio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Composers,
    Studios,
}

impl Tab {
    pub fn search_placeholder(self) -> &'static str {
        match self {
            Tab::Composers => "Search composers or places\u{2026}",
            Tab::Studios => "Search studios\u{2026}",
        }
    }
}

/// Keys a row header reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Other,
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// Something the user did in the sidebar or its controls.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    HeaderClick(String),
    HeaderKey(String, Key),
    HeaderHover(String, bool),
    RouteClick(String, usize),
    /// A click that landed outside every composer row.
    OutsideClick,
    StudioClick(String),
    StudioHover(String, bool),
    SelectTab(Tab),
    Search(String),
    ToggleGlobalView,
    Timeline(i32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarState {
    pub tab: Tab,
    pub query: String,
    /// The single expanded composer row.
    pub expanded: Option<String>,
    /// Composer rows filtered out by the search query.
    pub hidden: HashSet<String>,
}

impl SidebarState {
    /// Toggle a row. Returns true when the row became expanded.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
            false
        } else {
            self.expanded = Some(id.to_string());
            true
        }
    }

    pub fn collapse(&mut self, id: &str) {
        if self.expanded.as_deref() == Some(id) {
            self.expanded = None;
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded = None;
    }

    /// Recompute which composer rows the query hides.
    pub fn apply_search(&mut self, composers: &[Composer], query: &str) {
        self.query = query.to_string();
        let needle = query.trim().to_lowercase();
        self.hidden = composers
            .iter()
            .filter(|c| !matches_search(c, &needle))
            .map(|c| c.id.clone())
            .collect();
    }
}

/// Lowercased text a composer row is searched by.
pub fn search_haystack(composer: &Composer) -> String {
    let mut hay = format!("{} {}", composer.name, composer.bio);
    for route in &composer.routes {
        hay.push(' ');
        hay.push_str(&geo::city_for_route(route));
        hay.push(' ');
        hay.push_str(&route.label);
    }
    hay.to_lowercase()
}

/// `needle` is expected trimmed and lowercased.
pub fn matches_search(composer: &Composer, needle: &str) -> bool {
    search_haystack(composer).contains(needle)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteItem {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposerRow {
    pub id: String,
    pub color: String,
    pub name: String,
    pub meta: String,
    pub bio: String,
    pub routes: Vec<RouteItem>,
    pub expanded: bool,
    pub active: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudioRow {
    pub id: String,
    pub name: String,
    pub years: String,
    pub bio: String,
    /// The active row also shows its bio.
    pub active: bool,
}

/// "City • years", or just the city for undated routes.
pub fn route_item_text(route: &Route) -> String {
    let city = geo::city_for_route(route);
    match route.years.as_deref() {
        Some(years) => format!("{city} \u{2022} {years}"),
        None => city,
    }
}

pub fn composer_rows(
    store: &EntityStore,
    sidebar: &SidebarState,
    active: Option<&str>,
    palette: &[String],
) -> Vec<ComposerRow> {
    store
        .composers
        .iter()
        .enumerate()
        .map(|(idx, c)| ComposerRow {
            id: c.id.clone(),
            color: palette_color(palette, idx),
            name: c.name.clone(),
            meta: c.meta_line(),
            bio: c.bio.clone(),
            routes: c
                .routes
                .iter()
                .enumerate()
                .map(|(index, r)| RouteItem {
                    index,
                    text: route_item_text(r),
                })
                .collect(),
            expanded: sidebar.expanded.as_deref() == Some(c.id.as_str()),
            active: active == Some(c.id.as_str()),
            hidden: sidebar.hidden.contains(&c.id),
        })
        .collect()
}

pub fn studio_rows(studios: &[Studio], active: Option<&str>) -> Vec<StudioRow> {
    studios
        .iter()
        .map(|s| StudioRow {
            id: s.id.clone(),
            name: s.name.clone(),
            years: s.years.clone(),
            bio: s.bio.clone(),
            active: active == Some(s.id.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer(id: &str, name: &str, bio: &str, routes: Vec<Route>) -> Composer {
        Composer {
            id: id.into(),
            name: name.into(),
            bio: bio.into(),
            routes,
            ..Composer::default()
        }
    }

    fn route(label: &str, city: Option<&str>, years: Option<&str>) -> Route {
        Route {
            label: label.into(),
            city: city.map(Into::into),
            years: years.map(Into::into),
            ..Route::default()
        }
    }

    #[test]
    fn test_only_one_row_expanded() {
        let mut s = SidebarState::default();
        assert!(s.toggle("a"));
        assert!(s.toggle("b"));
        assert_eq!(s.expanded.as_deref(), Some("b"));
        assert!(!s.toggle("b"));
        assert_eq!(s.expanded, None);
    }

    #[test]
    fn test_collapse_only_matching_row() {
        let mut s = SidebarState::default();
        s.toggle("a");
        s.collapse("b");
        assert_eq!(s.expanded.as_deref(), Some("a"));
        s.collapse("a");
        assert_eq!(s.expanded, None);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let composers = vec![
            composer("a", "Ravel", "", vec![route("Tour", Some("New York"), None)]),
            composer("b", "Satie", "Gymnopédies composer", vec![]),
            composer("c", "Holst", "", vec![route("Lived in London", None, None)]),
        ];
        let mut s = SidebarState::default();
        s.apply_search(&composers, "  NEW york ");
        assert_eq!(s.hidden, HashSet::from(["b".to_string(), "c".to_string()]));
        s.apply_search(&composers, "GYMNO");
        assert!(!s.hidden.contains("b"));
        s.apply_search(&composers, "london");
        assert!(!s.hidden.contains("c"));
        s.apply_search(&composers, "");
        assert!(s.hidden.is_empty());
    }

    #[test]
    fn test_route_item_text() {
        assert_eq!(
            route_item_text(&route("Studied in Leipzig", None, Some("1840-1842"))),
            "Leipzig \u{2022} 1840-1842"
        );
        assert_eq!(route_item_text(&route("", None, None)), "Location");
    }

    #[test]
    fn test_rows_reflect_state() {
        let store = EntityStore {
            composers: vec![composer("a", "A", "", vec![]), composer("b", "B", "", vec![])],
            studios: vec![Studio {
                id: "s".into(),
                ..Studio::default()
            }],
        };
        let mut s = SidebarState::default();
        s.toggle("b");
        s.hidden.insert("a".into());
        let rows = composer_rows(&store, &s, Some("b"), &[]);
        assert!(rows[0].hidden && !rows[0].expanded);
        assert!(rows[1].expanded && rows[1].active);
        assert_eq!(rows[1].color, "#3cb44b");

        let studios = studio_rows(&store.studios, Some("s"));
        assert!(studios[0].active);
    }

    #[test]
    fn test_tab_placeholder_and_keys() {
        assert_eq!(Tab::Studios.search_placeholder(), "Search studios\u{2026}");
        assert_eq!(Key::from_name(" "), Key::Space);
        assert_eq!(Key::from_name("Escape"), Key::Escape);
        assert_eq!(Key::from_name("a"), Key::Other);
    }
}
