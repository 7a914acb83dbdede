use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo::{self, LatLng};

/// A historical composer and the places they travelled to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Composer {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub birth_year: String,
    #[serde(deserialize_with = "lenient::text")]
    pub death_year: String,
    #[serde(deserialize_with = "lenient::text")]
    pub country: String,
    #[serde(deserialize_with = "lenient::text")]
    pub bio: String,
    #[serde(deserialize_with = "lenient::list")]
    pub routes: Vec<Route>,
    #[serde(deserialize_with = "lenient::list")]
    pub clips: Vec<Clip>,
}

impl Composer {
    /// Sidebar meta line, e.g. "Austria 1756 – 1791".
    pub fn meta_line(&self) -> String {
        let mut life_span = self.birth_year.clone();
        if !self.death_year.is_empty() {
            life_span.push_str(" \u{2013} ");
            life_span.push_str(&self.death_year);
        }
        format!("{} {}", self.country, life_span).trim().to_string()
    }
}

/// One leg of a composer's travels. Coordinates are kept as supplied
/// (`[longitude, latitude]`) and converted on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Route {
    #[serde(deserialize_with = "lenient::text")]
    pub label: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub years: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub city: Option<String>,
    pub from: Option<Value>,
    pub to: Option<Value>,
    pub center: Option<Value>,
    /// `Some` whenever the key is present in the document, including `null`.
    #[serde(deserialize_with = "lenient::present")]
    pub clip_index: Option<Value>,
    #[serde(deserialize_with = "lenient::object")]
    pub clip: Option<Clip>,
}

impl Route {
    /// Line start: `from`, else `center`.
    pub fn source(&self) -> Option<LatLng> {
        Self::endpoint(self.from.as_ref().or(self.center.as_ref()))
    }

    /// Line end and marker position: `to`, else `center`.
    pub fn destination(&self) -> Option<LatLng> {
        Self::endpoint(self.to.as_ref().or(self.center.as_ref()))
    }

    fn endpoint(raw: Option<&Value>) -> Option<LatLng> {
        geo::normalize_coordinate(raw?).lat_lng()
    }

    pub fn start_year(&self) -> Option<i32> {
        self.years.as_deref().and_then(geo::start_year)
    }

    /// The clip attached to this route.
    ///
    /// With a `clipIndex` key: `null` or `"none"` means no clip, a number that
    /// indexes one of `clips` selects it, anything else falls back to the
    /// literal `clip`. Without the key: the literal `clip`, then the first
    /// of `clips`.
    pub fn resolve_clip<'a>(&'a self, clips: &'a [Clip]) -> Option<&'a Clip> {
        match &self.clip_index {
            Some(Value::Null) => None,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("none") => None,
            Some(index) => {
                let n = geo::loose_number(index);
                let indexed = if n.is_finite() && n >= 0.0 && n.fract() == 0.0 {
                    clips.get(n as usize)
                } else {
                    None
                };
                indexed.or(self.clip.as_ref())
            }
            None => self.clip.as_ref().or_else(|| clips.first()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clip {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub year: String,
    #[serde(deserialize_with = "lenient::text")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Studio {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub years: String,
    #[serde(deserialize_with = "lenient::text")]
    pub bio: String,
    pub center: Option<Value>,
}

impl Studio {
    pub fn center(&self) -> Option<LatLng> {
        geo::normalize_coordinate(self.center.as_ref()?).lat_lng()
    }
}

/// Every entity loaded from one document, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    pub composers: Vec<Composer>,
    pub studios: Vec<Studio>,
}

impl EntityStore {
    pub fn composer(&self, id: &str) -> Option<&Composer> {
        self.composers.iter().find(|c| c.id == id)
    }

    pub fn composer_index(&self, id: &str) -> Option<usize> {
        self.composers.iter().position(|c| c.id == id)
    }

    pub fn studio(&self, id: &str) -> Option<&Studio> {
        self.studios.iter().find(|s| s.id == id)
    }
}

/// Best-effort field extraction: wrong types degrade to empty values instead
/// of failing the whole document.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(d)?).filter(|s| !s.is_empty()))
    }

    pub fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
        Value::deserialize(d).map(Some)
    }

    pub fn object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Value::deserialize(d)? {
            v @ Value::Object(_) => Ok(serde_json::from_value(v).ok()),
            _ => Ok(None),
        }
    }

    /// Malformed elements become defaults so positions stay aligned.
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        match Value::deserialize(d)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap_or_default())
                .collect()),
            _ => Ok(Vec::new()),
        }
    }
}
