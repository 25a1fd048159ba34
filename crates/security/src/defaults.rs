//! Built-in policy tables.
//!
//! Entries are lowercase; a trailing `*` marks a prefix-wildcard rule.

/// Elements removed together with their whole subtree.
pub const DENIED_TAGS: &[&str] = &[
    "script", "iframe", "textarea", "form", "button", "select", "input", "meta", "style", "link",
    "title", "embed", "object", "details", "summary", "plaintext",
];

/// Attributes permitted on any element.
pub const HTML_ATTRIBUTES: &[&str] = &[
    "abbr", "align", "alt", "axis", "bgcolor", "border", "cellpadding", "cellspacing", "class",
    "clear", "color", "cols", "compact", "coords", "dir", "face", "headers", "height", "hreflang",
    "hspace", "ismap", "lang", "language", "nohref", "nowrap", "rel", "rev", "rows", "rules",
    "scope", "scrolling", "shape", "size", "span", "start", "summary", "tabindex", "target",
    "title", "type", "valign", "value", "vspace", "width", "checked", "mathvariant", "encoding",
    "id", "name", "background", "cite", "href", "longdesc", "src", "usemap", "xlink:href",
    "data-*", "style",
];

/// SVG presentation and geometry attributes, also permitted on any element.
pub const SVG_ATTRIBUTES: &[&str] = &[
    "accent-height", "accumulate", "additive", "alphabetic", "arabic-form", "ascent",
    "baseprofile", "bbox", "begin", "by", "calcmode", "cap-height", "class", "color",
    "color-rendering", "content", "cx", "cy", "d", "dx", "dy", "descent", "display", "dur", "end",
    "fill", "fill-rule", "font-family", "font-size", "font-stretch", "font-style", "font-variant",
    "font-weight", "from", "fx", "fy", "g1", "g2", "glyph-name", "gradientunits", "hanging",
    "height", "horiz-adv-x", "horiz-origin-x", "ideographic", "k", "keypoints", "keysplines",
    "keytimes", "lang", "marker-end", "marker-mid", "marker-start", "markerheight",
    "markerunits", "markerwidth", "mathematical", "max", "min", "offset", "opacity", "orient",
    "origin", "overline-position", "overline-thickness", "panose-1", "path", "pathlength",
    "points", "preserveaspectratio", "r", "refx", "refy", "repeatcount", "repeatdur",
    "requiredextensions", "requiredfeatures", "restart", "rotate", "rx", "ry", "slope", "stemh",
    "stemv", "stop-color", "stop-opacity", "strikethrough-position", "strikethrough-thickness",
    "stroke", "stroke-dasharray", "stroke-dashoffset", "stroke-linecap", "stroke-linejoin",
    "stroke-miterlimit", "stroke-opacity", "stroke-width", "systemlanguage", "target",
    "text-anchor", "to", "transform", "type", "u1", "u2", "underline-position",
    "underline-thickness", "unicode", "unicode-range", "units-per-em", "values", "version",
    "viewbox", "visibility", "width", "widths", "x", "x-height", "x1", "x2", "xlink:actuate",
    "xlink:arcrole", "xlink:role", "xlink:show", "xlink:title", "xlink:type", "xml:base",
    "xml:lang", "xml:space", "xmlns", "xmlns:xlink", "y", "y1", "y2", "zoomandpan",
];

/// Attributes whose value is followed as a link or loaded as a resource.
pub const URI_ATTRIBUTES: &[&str] =
    &["href", "src", "background", "cite", "longdesc", "usemap", "xlink:href"];

/// Schemes that run script, plus the single-letter `x:` obfuscation scheme.
pub const DANGEROUS_SCHEMES: &[&str] = &["javascript", "vbscript", "livescript", "x"];

/// Inline event handler attributes are `on` followed by the event name.
pub const EVENT_HANDLER_PREFIX: &str = "on";
