//! Line-protocol enrichment.
//!
//! A measurement line looks like:
//! ```text
//! <measurement>[,tag=value...] <field=value...> [timestamp]
//! ```
//!
//! Enrichment only ever appends comma-separated tags to the first
//! space-delimited token; the field and timestamp tokens are left untouched.

use crate::topic::TopicTags;

/// Append the topic-derived tags (and the resolved `bizLocation`, if any)
/// to the measurement token of a line-protocol payload.
///
/// A payload without a space has only a measurement token; it is tagged and
/// returned without a remainder.
pub fn enrich_line(payload: &str, tags: &TopicTags, biz_location: Option<&str>) -> String {
    let (head, rest) = match payload.split_once(' ') {
        Some((head, rest)) => (head, Some(rest)),
        None => (payload, None),
    };

    let mut line = String::with_capacity(payload.len() + 64);
    line.push_str(head);
    line.push_str(",company=");
    line.push_str(&tags.company);
    line.push_str(",site=");
    line.push_str(&tags.site);
    line.push_str(",country=");
    line.push_str(&tags.country);
    line.push_str(",city=");
    line.push_str(&tags.city);
    line.push_str(",sID=");
    line.push_str(&tags.sensor_mac);

    if let Some(biz) = biz_location {
        line.push_str(",bizLocation=");
        line.push_str(biz);
    }

    if let Some(rest) = rest {
        line.push(' ');
        line.push_str(rest);
    }

    line
}
