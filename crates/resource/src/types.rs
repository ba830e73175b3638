//! Per-resource-type decoders (§4.7): icons, cursors, patterns, color
//! tables, text, structured instrument/song records, `PICT` metadata, and
//! disassembled code resources.

use rsrc_errors::Error;
use rsrc_io::Reader;

use crate::mac_roman;
use crate::quickdraw::{read_color_table, Color, Image, Rect};

fn oor(error: rsrc_io::OutOfRange) -> Error {
    Error::OutOfRange(error.offset, error.needed, error.len)
}

/// A 1-bit-per-pixel bitmap: `true` = black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major bits, one `bool` per pixel.
    pub bits: Vec<bool>,
}

impl MonoBitmap {
    fn to_image(&self) -> Image {
        let mut image = Image { width: self.width, height: self.height, rgba: vec![0u8; self.width as usize * self.height as usize * 4] };
        for (index, &bit) in self.bits.iter().enumerate() {
            let value = if bit { 0 } else { 0xFF };
            image.rgba[index * 4] = value;
            image.rgba[index * 4 + 1] = value;
            image.rgba[index * 4 + 2] = value;
            image.rgba[index * 4 + 3] = 0xFF;
        }
        image
    }
}

fn read_mono_bitmap(bytes: &[u8], offset: usize, width: u32, height: u32) -> Result<MonoBitmap, Error> {
    let row_bytes = width.div_ceil(8) as usize;
    let needed = row_bytes * height as usize;
    let slice = bytes
        .get(offset..offset + needed)
        .ok_or_else(|| Error::MalformedContainer(format!("mono bitmap needs {needed} bytes at offset {offset}, resource has {}", bytes.len())))?;

    let mut bits = Vec::with_capacity(width as usize * height as usize);
    for row in 0..height as usize {
        let row_slice = &slice[row * row_bytes..(row + 1) * row_bytes];
        for col in 0..width as usize {
            let byte = row_slice[col / 8];
            let bit = (byte >> (7 - col % 8)) & 1 != 0;
            bits.push(bit);
        }
    }

    Ok(MonoBitmap { width, height, bits })
}

/// Decode an indexed-byte-per-pixel icon body via a linear grayscale ramp.
///
/// The real system icon palette (8-bit and 4-bit variants) is a fixed,
/// large vendor asset this crate does not embed (§1 Non-goals list opaque
/// sub-libraries as out of scope); index values are mapped to grayscale
/// intensity instead of the true palette colors.
fn read_indexed_icon(bytes: &[u8], offset: usize, width: u32, height: u32, bits_per_pixel: u32) -> Result<Image, Error> {
    let pixels_per_byte = 8 / bits_per_pixel;
    let row_bytes = (width as usize).div_ceil(pixels_per_byte as usize);
    let needed = row_bytes * height as usize;
    let slice = bytes
        .get(offset..offset + needed)
        .ok_or_else(|| Error::MalformedContainer(format!("indexed icon needs {needed} bytes at offset {offset}, resource has {}", bytes.len())))?;

    let max_value = (1u32 << bits_per_pixel) - 1;
    let mut image = Image { width, height, rgba: vec![0u8; width as usize * height as usize * 4] };

    for y in 0..height as usize {
        let row = &slice[y * row_bytes..(y + 1) * row_bytes];
        for x in 0..width as usize {
            let byte = row[x / pixels_per_byte as usize] as u32;
            let shift = 8 - bits_per_pixel * (x as u32 % pixels_per_byte + 1);
            let index = (byte >> shift) & max_value;
            let gray = (255 - index * 255 / max_value.max(1)) as u8;

            let pixel_index = (y * width as usize + x) * 4;
            image.rgba[pixel_index] = gray;
            image.rgba[pixel_index + 1] = gray;
            image.rgba[pixel_index + 2] = gray;
            image.rgba[pixel_index + 3] = 0xFF;
        }
    }

    Ok(image)
}

/// A decoded icon-family image plus its optional mask (§4.7: masked
/// variants are sourced from the matching `#` resource in the same fork).
#[derive(Debug, Clone)]
pub struct IconImage {
    /// The glyph itself.
    pub image: Image,
    /// The matching mask bitmap, if a `#`/mask resource was supplied.
    pub mask: Option<MonoBitmap>,
}

/// Decode a monochrome icon family member (`SICN`, `ICON`, `ICN#`, `ics#`,
/// `icm#`) at `width`x`height`. `ICN#`/`ics#`/`icm#` carry the icon bitmap
/// followed immediately by an equal-sized mask bitmap.
pub fn decode_mono_icon(bytes: &[u8], width: u32, height: u32, has_inline_mask: bool) -> Result<IconImage, Error> {
    let icon_bitmap = read_mono_bitmap(bytes, 0, width, height)?;
    let row_bytes = width.div_ceil(8) as usize;
    let bitmap_size = row_bytes * height as usize;

    let mask = if has_inline_mask { Some(read_mono_bitmap(bytes, bitmap_size, width, height)?) } else { None };

    Ok(IconImage { image: icon_bitmap.to_image(), mask })
}

/// Decode an indexed-color icon family member (`icl8`, `ics8`, `icm8`,
/// `kcs8`, `icl4`, `ics4`, `icm4`, `kcs4`) at `width`x`height`, pairing it
/// with an externally-supplied mask bitmap (from the matching `#`
/// resource, if the caller has one).
pub fn decode_indexed_icon(bytes: &[u8], width: u32, height: u32, bits_per_pixel: u32, mask: Option<MonoBitmap>) -> Result<IconImage, Error> {
    let image = read_indexed_icon(bytes, 0, width, height, bits_per_pixel)?;
    Ok(IconImage { image, mask })
}

/// Decode `SICN`, which packs one or more 32x32 1-bit icons back to back
/// with no count prefix; the resource's length determines how many.
pub fn decode_sicn(bytes: &[u8]) -> Result<Vec<Image>, Error> {
    const ICON_BYTES: usize = 32 * 32 / 8;

    if bytes.len() % ICON_BYTES != 0 {
        return Err(Error::MalformedContainer(format!("SICN length {} is not a multiple of {ICON_BYTES}", bytes.len())));
    }

    bytes.chunks_exact(ICON_BYTES).map(|chunk| read_mono_bitmap(chunk, 0, 32, 32).map(|bitmap| bitmap.to_image())).collect()
}

/// A cursor: image, mask, and hotspot (§4.7).
#[derive(Debug, Clone)]
pub struct Cursor {
    /// The cursor glyph.
    pub image: Image,
    /// The 1-bit mask (opaque region).
    pub mask: MonoBitmap,
    /// Hotspot, `(x, y)`.
    pub hotspot: (i16, i16),
}

/// Decode a `CURS` resource: a 16x16 1-bit bitmap, a 16x16 1-bit mask, and
/// a hotspot. The hotspot field may be absent (bytes 0x40-0x43 missing
/// entirely); callers get `(0xFFFF as i16, 0xFFFF as i16)` in that case.
pub fn decode_curs(bytes: &[u8]) -> Result<Cursor, Error> {
    let bitmap = read_mono_bitmap(bytes, 0, 16, 16)?;
    let mask = read_mono_bitmap(bytes, 32, 16, 16)?;

    let hotspot = if bytes.len() >= 0x44 {
        let y = i16::from_be_bytes([bytes[0x40], bytes[0x41]]);
        let x = i16::from_be_bytes([bytes[0x42], bytes[0x43]]);
        (x, y)
    } else {
        (-1, -1)
    };

    Ok(Cursor { image: bitmap.to_image(), mask, hotspot })
}

/// A color cursor (`crsr`): color image, 1-bit mask, and hotspot.
pub fn decode_crsr(bytes: &[u8]) -> Result<Cursor, Error> {
    let mut reader = Reader::new(bytes);

    let cursor_type = reader.get_u16be().map_err(oor)?;
    if cursor_type != 0x8000 && cursor_type != 0x8001 {
        return Err(Error::MalformedContainer(format!("crsr type word {cursor_type:#06x} is neither 0x8000 nor 0x8001")));
    }

    let _pixmap_ptr = reader.get_u32be().map_err(oor)?;
    let _mask_bitmap_ptr = reader.get_u32be().map_err(oor)?;
    let _data_ptr = reader.get_u32be().map_err(oor)?;
    let hotspot_y = reader.get_i16be().map_err(oor)?;
    let hotspot_x = reader.get_i16be().map_err(oor)?;
    let _color_table_ptr = reader.get_u32be().map_err(oor)?;
    let _reserved = reader.get_u32be().map_err(oor)?;

    let mono_bitmap_offset = reader.position();
    let bitmap = read_mono_bitmap(bytes, mono_bitmap_offset, 16, 16)?;
    let mask = read_mono_bitmap(bytes, mono_bitmap_offset + 32, 16, 16)?;

    Ok(Cursor { image: bitmap.to_image(), mask, hotspot: (hotspot_x, hotspot_y) })
}

/// A color icon (`cicn`): color image, mask bitmap, and 1-bit bitmap, all
/// sharing one set of bounds.
#[derive(Debug, Clone)]
pub struct ColorIcon {
    /// The pixmap-derived color image.
    pub image: Image,
    /// The mask bitmap (opacity).
    pub mask: MonoBitmap,
    /// The 1-bit black-and-white fallback bitmap.
    pub mono: MonoBitmap,
}

/// Decode a `cicn` resource: pixmap header, mask bitmap header, 1-bit
/// bitmap header, then color table, mask data, bitmap data, pixel data, in
/// that order.
pub fn decode_cicn(bytes: &[u8]) -> Result<ColorIcon, Error> {
    let mut reader = Reader::new(bytes);

    let pixmap_header = crate::quickdraw::PixelMapHeader::read(&mut reader)?;
    let mask_bounds = Rect::read(&mut reader)?;
    let _mask_row_bytes = reader.get_u16be().map_err(oor)?;
    let bitmap_bounds = Rect::read(&mut reader)?;
    let _bitmap_row_bytes = reader.get_u16be().map_err(oor)?;
    let _icon_data_ptr = reader.get_u32be().map_err(oor)?;
    let _mask_data_ptr = reader.get_u32be().map_err(oor)?;
    let _bitmap_data_ptr = reader.get_u32be().map_err(oor)?;
    let _icon_data = reader.get_u32be().map_err(oor)?;

    let mask_width = mask_bounds.width().max(0) as u32;
    let mask_height = mask_bounds.height().max(0) as u32;
    let bitmap_width = bitmap_bounds.width().max(0) as u32;
    let bitmap_height = bitmap_bounds.height().max(0) as u32;

    let mask_bytes = mask_width.div_ceil(8) as usize * mask_height as usize;
    let mask = read_mono_bitmap(reader.remaining(), 0, mask_width, mask_height)?;
    reader.go_to(reader.position() + mask_bytes).map_err(oor)?;

    let bitmap_bytes = bitmap_width.div_ceil(8) as usize * bitmap_height as usize;
    let mono = read_mono_bitmap(reader.remaining(), 0, bitmap_width, bitmap_height)?;
    reader.go_to(reader.position() + bitmap_bytes).map_err(oor)?;

    let color_table = read_color_table(&mut reader, false)?;

    let pixel_data_width = pixmap_header.bounds.width().max(0) as u32;
    let pixel_data_height = pixmap_header.bounds.height().max(0) as u32;
    let pixel_bytes = pixmap_header.row_bytes as usize * pixel_data_height as usize;
    let pixel_data = reader.get_bytes(pixel_bytes).map_err(oor)?;

    let image = if pixmap_header.pixel_type == 0 {
        crate::quickdraw::decode_indexed_image(&pixmap_header, pixel_data, &color_table)?
    } else {
        crate::quickdraw::decode_direct_image(&pixmap_header, pixel_data)?
    };

    debug_assert_eq!(image.width, pixel_data_width);

    Ok(ColorIcon { image, mask, mono })
}

/// An 8x8 monochrome QuickDraw pattern.
pub type MonoPattern = [u8; 8];

/// Parse a `PAT ` resource (one 8x8 pattern) or a `PAT#` resource
/// (length-prefixed list of 8x8 patterns).
pub fn decode_patterns(bytes: &[u8], is_list: bool) -> Result<Vec<MonoPattern>, Error> {
    let mut reader = Reader::new(bytes);

    let count = if is_list { reader.get_u16be().map_err(oor)? } else { 1 };

    let mut patterns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let bytes = reader.get_bytes(8).map_err(oor)?;
        let mut pattern = [0u8; 8];
        pattern.copy_from_slice(bytes);
        patterns.push(pattern);
    }

    Ok(patterns)
}

/// A pixel pattern (`ppat`): always a mono pattern, plus a color pattern
/// for types 1/3.
#[derive(Debug, Clone)]
pub struct PixelPattern {
    /// Pattern type (0/2 = monochrome-only, 1/3 = has a color image too).
    pub pattern_type: u16,
    /// The 8x8 monochrome fallback pattern.
    pub mono: MonoPattern,
    /// The color pattern image, present for types 1 and 3.
    pub color: Option<Image>,
}

/// Decode a `ppat` resource (or one entry of a `ppt#` list, given its
/// slice).
pub fn decode_ppat(bytes: &[u8]) -> Result<PixelPattern, Error> {
    let mut reader = Reader::new(bytes);

    let pattern_type = reader.get_u16be().map_err(oor)?;
    let _pixmap_ptr = reader.get_u32be().map_err(oor)?;
    let _color_table_ptr = reader.get_u32be().map_err(oor)?;
    let _pattern_data_ptr = reader.get_u32be().map_err(oor)?;
    let mono_bytes = reader.get_bytes(8).map_err(oor)?;
    let mut mono = [0u8; 8];
    mono.copy_from_slice(mono_bytes);

    let color = if pattern_type == 1 || pattern_type == 3 {
        let pixmap_header = crate::quickdraw::PixelMapHeader::read(&mut reader)?;
        let color_table = read_color_table(&mut reader, false)?;

        let height = pixmap_header.bounds.height().max(0) as u32;
        let pixel_bytes = pixmap_header.row_bytes as usize * height as usize;
        let pixel_data = reader.get_bytes(pixel_bytes).map_err(oor)?;

        let image = if pixmap_header.pixel_type == 0 {
            crate::quickdraw::decode_indexed_image(&pixmap_header, pixel_data, &color_table)?
        } else {
            crate::quickdraw::decode_direct_image(&pixmap_header, pixel_data)?
        };

        Some(image)
    } else {
        None
    };

    Ok(PixelPattern { pattern_type, mono, color })
}

/// `pltt`/`clut` color table, already resolved to plain RGB16 entries
/// (§4.7: `pltt` is exclusive count, `clut` is inclusive).
pub fn decode_palette(bytes: &[u8], inclusive: bool) -> Result<Vec<Color>, Error> {
    let mut reader = Reader::new(bytes);
    Ok(read_color_table(&mut reader, inclusive)?.into_iter().map(|(_, color)| color).collect())
}

/// `STR ` (one Pascal string) and `STR#` (a count-prefixed list).
pub fn decode_strings(bytes: &[u8], is_list: bool) -> Result<Vec<String>, Error> {
    let mut reader = Reader::new(bytes);

    let count = if is_list { reader.get_u16be().map_err(oor)? } else { 1 };

    let mut strings = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let raw = reader.get_pascal_string().map_err(oor)?;
        strings.push(mac_roman::decode(raw.as_ref()));
    }

    Ok(strings)
}

/// A decoded `TEXT` resource: Mac-Roman bytes rendered both as plain UTF-8
/// and as an RTF-escaped fragment.
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// Plain UTF-8 rendering.
    pub plain: String,
    /// RTF-escaped rendering, suitable for embedding in a `styl`-driven
    /// document body.
    pub rtf: String,
}

/// Decode a `TEXT` resource.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    let plain = mac_roman::decode(bytes);
    let rtf = mac_roman::to_rtf_escaped(&plain);
    DecodedText { plain, rtf }
}

const RTF_FONT_TABLE: [&str; 4] = ["Geneva", "Chicago", "Monaco", "Times"];

/// One styled run from a `styl` resource.
#[derive(Debug, Clone)]
pub struct StyleRun {
    /// Byte offset into the matching `TEXT` resource where this run
    /// starts.
    pub start: u32,
    /// Font family id, indexing [`RTF_FONT_TABLE`] (clamped).
    pub font_id: u16,
    /// Style bits (bold/italic/underline/etc, classic QuickDraw style
    /// mask).
    pub style: u8,
    /// Point size.
    pub point_size: u16,
    /// Text color.
    pub color: Color,
}

/// Parse a `styl` resource's style-run table.
pub fn decode_styl(bytes: &[u8]) -> Result<Vec<StyleRun>, Error> {
    let mut reader = Reader::new(bytes);
    let count = reader.get_u16be().map_err(oor)?;

    let mut runs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let start = reader.get_u32be().map_err(oor)?;
        let _line_height = reader.get_u16be().map_err(oor)?;
        let _ascent = reader.get_u16be().map_err(oor)?;
        let font_id = reader.get_u16be().map_err(oor)?;
        let style = reader.get_u8().map_err(oor)?;
        let _reserved = reader.get_u8().map_err(oor)?;
        let point_size = reader.get_u16be().map_err(oor)?;
        let color = Color::read(&mut reader)?;

        runs.push(StyleRun { start, font_id, style, point_size, color });
    }

    Ok(runs)
}

/// Render a `styl` resource plus its matching `TEXT` body as an RTF
/// document, with a font table built from [`RTF_FONT_TABLE`] and a color
/// table built from the colors actually observed in `runs`.
pub fn styl_to_rtf(runs: &[StyleRun], text_body: &[u8]) -> String {
    let plain = mac_roman::decode(text_body);

    let mut colors: Vec<Color> = Vec::new();
    for run in runs {
        if !colors.contains(&run.color) {
            colors.push(run.color);
        }
    }

    let mut rtf = String::from("{\\rtf1\\ansi\\deff0\n{\\fonttbl");
    for (index, name) in RTF_FONT_TABLE.iter().enumerate() {
        rtf.push_str(&format!("{{\\f{index} {name};}}"));
    }
    rtf.push_str("}\n{\\colortbl;");
    for color in &colors {
        let (r, g, b) = color.as8();
        rtf.push_str(&format!("\\red{r}\\green{g}\\blue{b};"));
    }
    rtf.push_str("}\n");

    for (index, run) in runs.iter().enumerate() {
        let end = runs.get(index + 1).map(|next| next.start as usize).unwrap_or(text_body.len());
        let start = (run.start as usize).min(plain.len());
        let end = end.min(plain.len()).max(start);
        let chunk = &plain[start..end];

        let font_index = (run.font_id as usize).min(RTF_FONT_TABLE.len() - 1);
        let color_index = colors.iter().position(|c| *c == run.color).unwrap_or(0) + 1;
        let bold = if run.style & 0x01 != 0 { "\\b" } else { "\\b0" };
        let italic = if run.style & 0x02 != 0 { "\\i" } else { "\\i0" };
        let underline = if run.style & 0x04 != 0 { "\\ul" } else { "\\ul0" };

        rtf.push_str(&format!("\\f{font_index}\\fs{}{bold}{italic}{underline}\\cf{color_index} ", run.point_size * 2));
        rtf.push_str(&mac_roman::to_rtf_escaped(chunk));
        rtf.push('\n');
    }

    rtf.push('}');
    rtf
}

/// A classic Sound Manager instrument definition (`INST`).
#[derive(Debug, Clone)]
pub struct Instrument {
    /// `snd ` resource id this instrument plays.
    pub snd_id: i16,
    /// MIDI base note the sample was recorded at.
    pub base_note: u8,
    /// Per-key-range entries, `(low_key, high_key, snd_id)`.
    pub key_ranges: Vec<(u8, u8, i16)>,
}

/// Decode an `INST` resource.
pub fn decode_inst(bytes: &[u8]) -> Result<Instrument, Error> {
    let mut reader = Reader::new(bytes);

    let snd_id = reader.get_i16be().map_err(oor)?;
    let base_note = reader.get_u8().map_err(oor)?;
    let _reserved = reader.get_u8().map_err(oor)?;
    let num_key_ranges = reader.get_u16be().map_err(oor)?;

    let mut key_ranges = Vec::with_capacity(num_key_ranges as usize);
    for _ in 0..num_key_ranges {
        let low = reader.get_u8().map_err(oor)?;
        let high = reader.get_u8().map_err(oor)?;
        let id = reader.get_i16be().map_err(oor)?;
        key_ranges.push((low, high, id));
    }

    Ok(Instrument { snd_id, base_note, key_ranges })
}

/// A classic `SONG` resource: references a set of instruments and
/// playback defaults for a `Tune` resource.
#[derive(Debug, Clone)]
pub struct Song {
    /// `Tune` resource id this song plays.
    pub tune_id: i16,
    /// Partition-to-instrument assignments, `(partition, inst_id)`.
    pub parts: Vec<(u8, i16)>,
}

/// Decode a `SONG` resource.
pub fn decode_song(bytes: &[u8]) -> Result<Song, Error> {
    let mut reader = Reader::new(bytes);

    let tune_id = reader.get_i16be().map_err(oor)?;
    let num_parts = reader.get_u16be().map_err(oor)?;

    let mut parts = Vec::with_capacity(num_parts as usize);
    for _ in 0..num_parts {
        let partition = reader.get_u8().map_err(oor)?;
        let _reserved = reader.get_u8().map_err(oor)?;
        let inst_id = reader.get_i16be().map_err(oor)?;
        parts.push((partition, inst_id));
    }

    Ok(Song { tune_id, parts })
}

/// `PICT` metadata: size and frame, without interpreting any opcode in the
/// picture body. A full QuickDraw picture engine is a separate collaborator
/// this crate doesn't implement (§4.7).
#[derive(Debug, Clone)]
pub struct PictMetadata {
    /// Declared picture size in bytes (informational on v2 pictures).
    pub size: u16,
    /// Picture frame rect.
    pub frame: Rect,
    /// `true` if the 4-byte `0x0011 0x02FF` version-2 header was found
    /// immediately after the frame.
    pub is_version_2: bool,
}

/// Parse a `PICT` resource's fixed 10-byte header.
pub fn decode_pict_metadata(bytes: &[u8]) -> Result<PictMetadata, Error> {
    let mut reader = Reader::new(bytes);

    let size = reader.get_u16be().map_err(oor)?;
    let frame = Rect::read(&mut reader)?;

    let is_version_2 = reader.peek_u16be().map(|op| op == 0x0011).unwrap_or(false);

    Ok(PictMetadata { size, frame, is_version_2 })
}

/// A disassembled code resource: its text listing plus the metadata
/// needed to place it in a segment (§4.7: `CODE 0` is the jump table,
/// other `CODE` entries may be near- or far-model).
#[derive(Debug, Clone)]
pub struct CodeResource {
    /// `true` if this is `CODE 0`, the segment jump table.
    pub is_jump_table: bool,
    /// Disassembly listing, one instruction (plus any alternate-branch
    /// commentary) per line.
    pub listing: String,
}

/// Decode a `CODE` resource. `CODE 0` is parsed as a jump table (above
/// A5, a 32-bit above-A5 size, a 32-bit A5-relocation size, then 8-byte
/// jump-table entries); any other `CODE` id is disassembled as 68K machine
/// code starting at offset 4 (the near-model header) via
/// [`rsrc_m68k::disassemble`].
pub fn decode_code(id: i16, bytes: &[u8]) -> Result<CodeResource, Error> {
    if id == 0 {
        let mut reader = Reader::new(bytes);
        let above_a5_size = reader.get_u32be().map_err(oor)?;
        let a5_relocation_size = reader.get_u32be().map_err(oor)?;

        let mut listing = format!("; jump table: above-A5 size {above_a5_size}, A5-relocation size {a5_relocation_size}\n");

        let mut index = 0;
        while reader.remaining().len() >= 8 {
            let offset = reader.get_u16be().map_err(oor)?;
            let _move_instruction = reader.get_u16be().map_err(oor)?;
            let segment_number = reader.get_u16be().map_err(oor)?;
            let _loadseg_trap = reader.get_u16be().map_err(oor)?;

            listing.push_str(&format!("; entry {index}: offset {offset:#06x}, segment {segment_number}\n"));
            index += 1;
        }

        return Ok(CodeResource { is_jump_table: true, listing });
    }

    let code = bytes.get(4..).ok_or_else(|| Error::MalformedContainer("CODE resource shorter than its 4-byte header".into()))?;
    let lines = rsrc_m68k::disassemble(code, 0, None, None)?;

    let mut listing = String::new();
    for line in &lines {
        listing.push_str(&format!("{:08x}: {}\n", line.address, line.text));
    }

    Ok(CodeResource { is_jump_table: false, listing })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_patterns_single() {
        let data = [0xFFu8, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00];
        let patterns = decode_patterns(&data, false).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0], data);
    }

    #[test]
    fn test_decode_strings_list() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.push(2);
        bytes.extend_from_slice(b"hi");
        bytes.push(3);
        bytes.extend_from_slice(b"bye");

        let strings = decode_strings(&bytes, true).unwrap();
        assert_eq!(strings, vec!["hi".to_string(), "bye".to_string()]);
    }

    #[test]
    fn test_decode_curs_missing_hotspot() {
        let data = vec![0u8; 32 + 32];
        let cursor = decode_curs(&data).unwrap();
        assert_eq!(cursor.hotspot, (-1, -1));
    }

    #[test]
    fn test_decode_inst() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&60i16.to_be_bytes());
        bytes.push(60);
        bytes.push(0);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.push(0);
        bytes.push(127);
        bytes.extend_from_slice(&60i16.to_be_bytes());

        let inst = decode_inst(&bytes).unwrap();
        assert_eq!(inst.snd_id, 60);
        assert_eq!(inst.key_ranges, vec![(0, 127, 60)]);
    }

    #[test]
    fn test_decode_pict_metadata() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u16.to_be_bytes());
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.extend_from_slice(&0i16.to_be_bytes());
        bytes.extend_from_slice(&100i16.to_be_bytes());
        bytes.extend_from_slice(&200i16.to_be_bytes());
        bytes.extend_from_slice(&0x0011u16.to_be_bytes());

        let metadata = decode_pict_metadata(&bytes).unwrap();
        assert_eq!(metadata.frame, Rect { y1: 0, x1: 0, y2: 100, x2: 200 });
        assert!(metadata.is_version_2);
    }
}
