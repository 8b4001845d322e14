//! File name templates: one `{}` or `{:0W}` placeholder replaced by the
//! file index, e.g. `"REC_{:04}.BIN"` → `"REC_0007.BIN"`.

use core::fmt::Write;

use heapless::String;

use crate::constants::MAX_FILENAME_LEN;

use super::error::FilenameError;

/// Rendered file name.
pub type FileName = String<MAX_FILENAME_LEN>;

/// Render `template` for file `index`.
pub fn format_filename(template: &str, index: u32) -> Result<FileName, FilenameError> {
    let open = template.find('{').ok_or(FilenameError::MissingPlaceholder)?;
    let close = template[open..]
        .find('}')
        .map(|at| open + at)
        .ok_or(FilenameError::BadPlaceholder)?;
    let (prefix, suffix) = (&template[..open], &template[close + 1..]);
    let width = parse_width(&template[open + 1..close])?;

    if suffix.contains('{') {
        return Err(FilenameError::BadPlaceholder);
    }

    let mut name = FileName::new();
    let too_long = FilenameError::TooLong {
        max: MAX_FILENAME_LEN,
    };
    name.push_str(prefix).map_err(|_| too_long)?;
    write!(name, "{:0width$}", index, width = width).map_err(|_| too_long)?;
    name.push_str(suffix).map_err(|_| too_long)?;
    Ok(name)
}

/// `""` → 0, `":0W"` → W.
fn parse_width(placeholder: &str) -> Result<usize, FilenameError> {
    if placeholder.is_empty() {
        return Ok(0);
    }
    let digits = placeholder
        .strip_prefix(":0")
        .filter(|d| !d.is_empty() && d.len() <= 2)
        .ok_or(FilenameError::BadPlaceholder)?;
    digits.parse().map_err(|_| FilenameError::BadPlaceholder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_placeholder() {
        assert_eq!(format_filename("F{}.bin", 7).unwrap(), "F7.bin");
        assert_eq!(format_filename("{}", 1234).unwrap(), "1234");
    }

    #[test]
    fn zero_padded_placeholder() {
        assert_eq!(format_filename("REC_{:04}.BIN", 7).unwrap(), "REC_0007.BIN");
        assert_eq!(format_filename("REC_{:04}.BIN", 12345).unwrap(), "REC_12345.BIN");
    }

    #[test]
    fn rejects_bad_templates() {
        assert_eq!(format_filename("plain.bin", 1), Err(FilenameError::MissingPlaceholder));
        assert_eq!(format_filename("F{.bin", 1), Err(FilenameError::BadPlaceholder));
        assert_eq!(format_filename("F{:x}.bin", 1), Err(FilenameError::BadPlaceholder));
        assert_eq!(format_filename("F{:04}_{}.bin", 1), Err(FilenameError::BadPlaceholder));
    }

    #[test]
    fn rejects_overlong_names() {
        let template = "a_very_long_directory_name/another_very_long_directory_name/file_{:016}.bin";
        assert!(template.len() < MAX_FILENAME_LEN);
        assert_eq!(
            format_filename(template, 1),
            Err(FilenameError::TooLong { max: MAX_FILENAME_LEN })
        );
    }
}
