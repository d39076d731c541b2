//! JSDoc tag reading.
//!
//! Only the tags that influence declaration checking are recognised:
//! `@const`, `@constant` and `@define` mark a constant binding, and
//! `@suppress {duplicate}` waives the hoisted redeclaration diagnostic.

use super::node::NodeFlags;
use memchr::memmem;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsDocTags {
    pub is_const: bool,
    pub is_define: bool,
    pub suppress_duplicate: bool,
}

impl JsDocTags {
    /// Read the tags of one `/** ... */` comment.
    pub fn parse(comment: &str) -> JsDocTags {
        let mut tags = JsDocTags::default();
        let bytes = comment.as_bytes();
        for at in memchr::memchr_iter(b'@', bytes) {
            let rest = &comment[at + 1..];
            let tag_len = rest
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(rest.len());
            match &rest[..tag_len] {
                "const" | "constant" => tags.is_const = true,
                "define" => tags.is_define = true,
                "suppress" => {
                    if suppresses_duplicate(&rest[tag_len..]) {
                        tags.suppress_duplicate = true;
                    }
                }
                _ => {}
            }
        }
        tags
    }

    pub fn is_empty(&self) -> bool {
        *self == JsDocTags::default()
    }

    /// The node flags these tags translate to.
    pub fn to_flags(self) -> NodeFlags {
        let mut flags = NodeFlags::empty();
        if self.is_const || self.is_define {
            flags |= NodeFlags::JSDOC_CONST;
        }
        if self.suppress_duplicate {
            flags |= NodeFlags::SUPPRESS_DUPLICATE;
        }
        flags
    }
}

/// `{duplicate}`, `{duplicate,checkTypes}` or `{checkTypes|duplicate}`
/// following a `@suppress` tag.
fn suppresses_duplicate(after_tag: &str) -> bool {
    let trimmed = after_tag.trim_start();
    let Some(body) = trimmed.strip_prefix('{') else {
        return false;
    };
    let Some(close) = memchr::memchr(b'}', body.as_bytes()) else {
        return false;
    };
    let list = &body[..close];
    memmem::find(list.as_bytes(), b"duplicate").is_some()
        && list
            .split([',', '|'])
            .any(|entry| entry.trim() == "duplicate")
}
