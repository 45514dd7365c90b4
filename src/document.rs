//! Print document generation.
//!
//! The export page shows the strip twice, side by side, each copy at a
//! quarter of the page width, with no page margin.

/// MIME type of the strip artifact.
pub const PNG_MIME: &str = "image/png";

/// Uniform type identifier of the strip artifact.
pub const PNG_UTI: &str = "public.png";

/// `data:` URI for a base64-encoded PNG.
pub fn data_uri(encoded: &str) -> String {
    format!("data:{PNG_MIME};base64,{encoded}")
}

/// The two-up print page for a base64-encoded strip.
///
/// Both copies are the identical artifact.
pub fn two_up_html(encoded: &str) -> String {
    let src = data_uri(encoded);
    format!(
        "<!DOCTYPE html><html><body style=\"margin:0\">\n\
         \x20 <div style=\"display:flex\">\n\
         \x20   <img src=\"{src}\" style=\"width:25%;height:auto\"/>\n\
         \x20   <img src=\"{src}\" style=\"width:25%;height:auto\"/>\n\
         \x20 </div>\n\
         </body></html>\n"
    )
}
