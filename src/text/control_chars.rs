/// Short label displayed in front of a control character when
/// [`crate::text::layout::Options::display_control_characters`] is set.
pub(crate) fn short_name(c: char) -> Option<&'static str> {
    const C0: [&str; 32] = [
        "NUL", "SOH", "STX", "ETX", "EOT", "ENQ", "ACK", "BEL", "BS", "HT", "LF", "VT", "FF", "CR",
        "SO", "SI", "DLE", "DC1", "DC2", "DC3", "DC4", "NAK", "SYN", "ETB", "CAN", "EM", "SUB",
        "ESC", "FS", "GS", "RS", "US",
    ];

    let name = match c {
        '\0'..='\u{1F}' => C0[c as usize],
        '\u{7F}' => "DEL",
        '\u{85}' => "NEL",
        '\u{A0}' => "NBSP",
        '\u{AD}' => "SHY",
        '\u{200B}' => "ZWSP",
        '\u{200C}' => "ZWNJ",
        '\u{200D}' => "ZWJ",
        '\u{2028}' => "LSEP",
        '\u{2029}' => "PSEP",
        '\u{FEFF}' => "BOM",
        _ => return None,
    };
    Some(name)
}
