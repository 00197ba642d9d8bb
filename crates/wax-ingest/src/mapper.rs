//! Schema mapping from raw elements to typed records
//!
//! One pure mapping function per entity kind, expressed as the [`DumpRecord`]
//! trait. Scalars come from attributes or single child-element text; repeated
//! groups become ordered vectors; singular nested structures take the first
//! match and ignore extras. A missing identity value or an unparseable
//! numeric field rejects the whole element with a [`MappingError`] — partial
//! records are never produced.
//!
//! ID placement differs per kind in the upstream dumps: releases and masters
//! carry `id` as an attribute, artists and labels as a child element.

use crate::element::Element;
use crate::models::{Artist, EntityKind, Label, Master, Release, ReleaseLabel, Track};
use thiserror::Error;

/// Per-record structural failure. Non-fatal: the element is discarded and
/// scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {id}: bad field `{field}`: {detail}")]
pub struct MappingError {
    pub kind: EntityKind,
    /// Best-effort extracted ID, or "unknown".
    pub id: String,
    pub field: String,
    pub detail: String,
}

impl MappingError {
    fn missing(kind: EntityKind, id: &str, field: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            field: field.to_string(),
            detail: "missing required value".to_string(),
        }
    }

    fn not_numeric(kind: EntityKind, id: &str, field: &str, raw: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            field: field.to_string(),
            detail: format!("not a number: `{raw}`"),
        }
    }
}

/// A record kind that can be scanned out of a dump file.
///
/// `from_element` is pure: same element in, same record (or error) out,
/// no side effects.
pub trait DumpRecord: Sized + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Root tag this kind's scanner looks for.
    fn root_tag() -> &'static str {
        Self::KIND.root_tag()
    }

    /// Map one assembled element into a typed record.
    fn from_element(el: &Element) -> Result<Self, MappingError>;

    /// Identity key within this kind's store.
    fn id(&self) -> u64;
}

fn id_from_attr(el: &Element, kind: EntityKind) -> Result<u64, MappingError> {
    let raw = el
        .attr("id")
        .ok_or_else(|| MappingError::missing(kind, "unknown", "id"))?;
    raw.parse()
        .map_err(|_| MappingError::not_numeric(kind, raw, "id", raw))
}

fn id_from_child(el: &Element, kind: EntityKind) -> Result<u64, MappingError> {
    let raw = el
        .child_text("id")
        .ok_or_else(|| MappingError::missing(kind, "unknown", "id"))?;
    raw.parse()
        .map_err(|_| MappingError::not_numeric(kind, raw, "id", raw))
}

fn text_or_empty(el: &Element, name: &str) -> String {
    el.child_text(name).unwrap_or_default().to_string()
}

/// Optional numeric child element; absent is fine, unparseable is not.
fn optional_u64_child(
    el: &Element,
    kind: EntityKind,
    id: &str,
    field: &str,
) -> Result<Option<u64>, MappingError> {
    match el.child_text(field) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| MappingError::not_numeric(kind, id, field, raw)),
    }
}

impl DumpRecord for Artist {
    const KIND: EntityKind = EntityKind::Artist;

    fn from_element(el: &Element) -> Result<Self, MappingError> {
        let id = id_from_child(el, Self::KIND)?;
        Ok(Artist {
            id,
            name: text_or_empty(el, "name"),
            real_name: text_or_empty(el, "realname"),
            profile: text_or_empty(el, "profile"),
            name_variations: el.grouped_texts("namevariations", "name"),
        })
    }

    fn id(&self) -> u64 {
        self.id
    }
}

impl DumpRecord for Label {
    const KIND: EntityKind = EntityKind::Label;

    fn from_element(el: &Element) -> Result<Self, MappingError> {
        let id = id_from_child(el, Self::KIND)?;
        Ok(Label {
            id,
            name: text_or_empty(el, "name"),
            contact_info: text_or_empty(el, "contactinfo"),
            profile: text_or_empty(el, "profile"),
            sub_labels: el.grouped_texts("sublabels", "label"),
        })
    }

    fn id(&self) -> u64 {
        self.id
    }
}

impl DumpRecord for Master {
    const KIND: EntityKind = EntityKind::Master;

    fn from_element(el: &Element) -> Result<Self, MappingError> {
        let id = id_from_attr(el, Self::KIND)?;
        let id_str = id.to_string();
        Ok(Master {
            id,
            title: text_or_empty(el, "title"),
            year: text_or_empty(el, "year"),
            main_release: optional_u64_child(el, Self::KIND, &id_str, "main_release")?,
            artist: el
                .descendant(&["artists", "artist", "name"])
                .map(|e| e.text.clone())
                .unwrap_or_default(),
            genres: el.grouped_texts("genres", "genre"),
            styles: el.grouped_texts("styles", "style"),
        })
    }

    fn id(&self) -> u64 {
        self.id
    }
}

impl DumpRecord for Release {
    const KIND: EntityKind = EntityKind::Release;

    fn from_element(el: &Element) -> Result<Self, MappingError> {
        let id = id_from_attr(el, Self::KIND)?;
        let id_str = id.to_string();

        // First labels>label entry only; extras are alternate pressings the
        // dump repeats.
        let label = el
            .descendant(&["labels", "label"])
            .map(|l| {
                let label_id = match l.attr("id") {
                    None | Some("") => 0,
                    Some(raw) => raw.parse().map_err(|_| {
                        MappingError::not_numeric(Self::KIND, &id_str, "labels>label id", raw)
                    })?,
                };
                Ok(ReleaseLabel {
                    name: l.attr("name").unwrap_or_default().to_string(),
                    catno: l.attr("catno").unwrap_or_default().to_string(),
                    id: label_id,
                })
            })
            .transpose()?;

        let tracks = el
            .child("tracklist")
            .map(|tl| {
                tl.children_named("track")
                    .map(|t| Track {
                        position: text_or_empty(t, "position"),
                        title: text_or_empty(t, "title"),
                        duration: text_or_empty(t, "duration"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Release {
            id,
            title: text_or_empty(el, "title"),
            country: text_or_empty(el, "country"),
            released: text_or_empty(el, "released"),
            master_id: optional_u64_child(el, Self::KIND, &id_str, "master_id")?,
            styles: el.grouped_texts("styles", "style"),
            genres: el.grouped_texts("genres", "genre"),
            label,
            artist: el
                .descendant(&["artists", "artist", "name"])
                .map(|e| e.text.clone())
                .unwrap_or_default(),
            tracks,
        })
    }

    fn id(&self) -> u64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{XmlDecoder, XmlToken};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tokio_util::sync::CancellationToken;

    fn element(xml: &str) -> Element {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        let mut decoder =
            XmlDecoder::from_gzip_bytes(encoder.finish().unwrap(), CancellationToken::new());
        match decoder.next_token().unwrap().unwrap() {
            XmlToken::Start { name, attrs } => {
                Element::collect(&mut decoder, name, attrs).unwrap()
            },
            other => panic!("expected start token, got {:?}", other),
        }
    }

    #[test]
    fn test_release_full_shape() {
        let el = element(
            r#"<release id="249504"><title>Stardust</title><country>US</country>
               <released>1957-03-01</released><master_id>7711</master_id>
               <styles><style>Swing</style><style>Big Band</style></styles>
               <genres><genre>Jazz</genre></genres>
               <labels><label name="Verve" catno="V-8176" id="904"/>
                       <label name="Extra" catno="X-1" id="905"/></labels>
               <artists><artist><name>Hoagy Carmichael</name></artist></artists>
               <tracklist>
                 <track><position>A1</position><title>Stardust</title><duration>3:19</duration></track>
                 <track><position>A2</position><title>Georgia</title><duration>3:05</duration></track>
               </tracklist></release>"#,
        );

        let release = Release::from_element(&el).unwrap();
        assert_eq!(release.id, 249504);
        assert_eq!(release.title, "Stardust");
        assert_eq!(release.country, "US");
        assert_eq!(release.master_id, Some(7711));
        assert_eq!(release.styles, vec!["Swing", "Big Band"]);
        assert_eq!(release.genres, vec!["Jazz"]);
        // first label wins, extras ignored
        let label = release.label.unwrap();
        assert_eq!(label.name, "Verve");
        assert_eq!(label.catno, "V-8176");
        assert_eq!(label.id, 904);
        assert_eq!(release.artist, "Hoagy Carmichael");
        assert_eq!(release.tracks.len(), 2);
        assert_eq!(release.tracks[0].position, "A1");
        assert_eq!(release.tracks[1].duration, "3:05");
    }

    #[test]
    fn test_release_minimal_defaults() {
        let el = element(r#"<release id="7"><title>Bare</title></release>"#);
        let release = Release::from_element(&el).unwrap();
        assert_eq!(release.id, 7);
        assert!(release.styles.is_empty());
        assert!(release.genres.is_empty());
        assert!(release.tracks.is_empty());
        assert!(release.label.is_none());
        assert_eq!(release.master_id, None);
        assert_eq!(release.artist, "");
    }

    #[test]
    fn test_release_non_numeric_id() {
        let el = element(r#"<release id="abc"><title>Bad</title></release>"#);
        let err = Release::from_element(&el).unwrap_err();
        assert_eq!(err.kind, EntityKind::Release);
        assert_eq!(err.id, "abc");
        assert_eq!(err.field, "id");
    }

    #[test]
    fn test_release_missing_id() {
        let el = element(r#"<release><title>Anon</title></release>"#);
        let err = Release::from_element(&el).unwrap_err();
        assert_eq!(err.id, "unknown");
        assert_eq!(err.field, "id");
    }

    #[test]
    fn test_release_bad_master_id() {
        let el = element(r#"<release id="9"><master_id>seven</master_id></release>"#);
        let err = Release::from_element(&el).unwrap_err();
        assert_eq!(err.id, "9");
        assert_eq!(err.field, "master_id");
    }

    #[test]
    fn test_release_bad_label_id() {
        let el = element(r#"<release id="9"><labels><label name="X" catno="1" id="oops"/></labels></release>"#);
        let err = Release::from_element(&el).unwrap_err();
        assert_eq!(err.field, "labels>label id");
    }

    #[test]
    fn test_artist_mapping() {
        let el = element(
            "<artist><id>132</id><name>Minnie Riperton</name>\
             <realname>Minnie Julia Riperton</realname><profile>Soul singer.</profile>\
             <namevariations><name>M. Riperton</name><name>Riperton</name></namevariations>\
             </artist>",
        );
        let artist = Artist::from_element(&el).unwrap();
        assert_eq!(artist.id, 132);
        assert_eq!(artist.name, "Minnie Riperton");
        assert_eq!(artist.real_name, "Minnie Julia Riperton");
        assert_eq!(artist.name_variations, vec!["M. Riperton", "Riperton"]);
    }

    #[test]
    fn test_artist_id_is_child_not_attr() {
        let el = element(r#"<artist id="5"><name>Wrong Place</name></artist>"#);
        let err = Artist::from_element(&el).unwrap_err();
        assert_eq!(err.id, "unknown");
    }

    #[test]
    fn test_label_mapping() {
        let el = element(
            "<label><id>23</id><name>Studio One</name><contactinfo>Kingston, JA</contactinfo>\
             <profile>Reggae institution.</profile>\
             <sublabels><label>Coxsone</label></sublabels></label>",
        );
        let label = Label::from_element(&el).unwrap();
        assert_eq!(label.id, 23);
        assert_eq!(label.name, "Studio One");
        assert_eq!(label.sub_labels, vec!["Coxsone"]);
    }

    #[test]
    fn test_master_mapping() {
        let el = element(
            r#"<master id="18500"><title>Maxinquaye</title><year>1995</year>
               <main_release>5678</main_release>
               <artists><artist><name>Tricky</name></artist></artists>
               <genres><genre>Electronic</genre></genres>
               <styles><style>Trip Hop</style></styles></master>"#,
        );
        let master = Master::from_element(&el).unwrap();
        assert_eq!(master.id, 18500);
        assert_eq!(master.main_release, Some(5678));
        assert_eq!(master.artist, "Tricky");
        assert_eq!(master.styles, vec!["Trip Hop"]);
    }

    #[test]
    fn test_mapping_is_pure() {
        let el = element(r#"<release id="1"><title>Same</title></release>"#);
        assert_eq!(
            Release::from_element(&el).unwrap(),
            Release::from_element(&el).unwrap()
        );
    }
}
