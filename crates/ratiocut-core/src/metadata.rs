//! User-editable export metadata.
//!
//! A [`MetadataMap`] is an ordered list of `key=value` pairs. It is edited as
//! plain text and embedded into every exported WebP as an XMP packet.

use serde::{Deserialize, Serialize};

const XMP_HEADER: &str = "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n\
<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n\
 <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n\
  <rdf:Description rdf:about=\"\" xmlns:ratiocut=\"https://ratiocut.app/ns/1.0/\">\n\
   <ratiocut:entries>\n\
    <rdf:Seq>\n";

const XMP_FOOTER: &str = "    </rdf:Seq>\n\
   </ratiocut:entries>\n\
  </rdf:Description>\n\
 </rdf:RDF>\n\
</x:xmpmeta>\n\
<?xpacket end=\"w\"?>";

/// Ordered string-to-string mapping.
///
/// Inserting an existing key replaces its value in place; iteration order is
/// first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataMap {
    entries: Vec<(String, String)>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => Some(std::mem::replace(v, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the `key=value` per-line text form.
    ///
    /// Blank lines and lines without `=` are skipped; keys and values are trimmed.
    pub fn parse_text(text: &str) -> Self {
        let mut map = Self::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            map.insert(key, value.trim());
        }
        map
    }

    /// Render as `key=value` lines.
    pub fn to_text(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize as an XMP packet holding one `rdf:li` per entry.
    pub fn to_xmp(&self) -> String {
        let mut xmp = String::from(XMP_HEADER);
        for (k, v) in self.iter() {
            xmp.push_str("     <rdf:li>");
            xmp.push_str(&escape_xml(&format!("{k}={v}")));
            xmp.push_str("</rdf:li>\n");
        }
        xmp.push_str(XMP_FOOTER);
        xmp
    }

    /// Read entries back out of a packet produced by [`MetadataMap::to_xmp`].
    pub fn from_xmp(xmp: &str) -> Self {
        let mut map = Self::new();
        let mut rest = xmp;
        while let Some(start) = rest.find("<rdf:li>") {
            rest = &rest[start + "<rdf:li>".len()..];
            let Some(end) = rest.find("</rdf:li>") else {
                break;
            };
            let item = unescape_xml(&rest[..end]);
            if let Some((k, v)) = item.split_once('=') {
                map.insert(k, v);
            }
            rest = &rest[end..];
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut map = MetadataMap::new();
        map.insert("Title", "Dunes");
        map.insert("Artist", "P. Holke");
        assert_eq!(map.insert("Title", "Dunes at dusk"), Some("Dunes".to_string()));
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["Title", "Artist"]);
        assert_eq!(map.get("Title"), Some("Dunes at dusk"));
    }

    #[test]
    fn test_parse_text_skips_noise() {
        let map = MetadataMap::parse_text("  Title = Dunes \n\nnot a pair\n=orphan\nNote=a=b\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Title"), Some("Dunes"));
        assert_eq!(map.get("Note"), Some("a=b"));
        assert_eq!(map.to_text(), "Title=Dunes\nNote=a=b");
    }

    #[test]
    fn test_xmp_preserves_special_characters_and_order() {
        let map: MetadataMap = [("Caption", "Sand & <wind>"), ("Copyright", "\"2024\"")]
            .into_iter()
            .collect();
        let xmp = map.to_xmp();
        assert!(xmp.contains("Sand &amp; &lt;wind&gt;"));
        assert_eq!(MetadataMap::from_xmp(&xmp), map);
    }

    #[test]
    fn test_empty_map_xmp_has_no_items() {
        let xmp = MetadataMap::new().to_xmp();
        assert!(xmp.starts_with("<?xpacket"));
        assert!(MetadataMap::from_xmp(&xmp).is_empty());
    }
}
