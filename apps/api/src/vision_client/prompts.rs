// Fixed prompts sent with every extraction request.
// Both ask for bare JSON; run_json still strips code fences when a model adds them.

/// Reads the technical specification sheet of an outdoor surface.
pub const PARSE_SPECS: &str = r#"You are a parser for outdoor advertising technical specifications.
From the provided image extract the following parameters and return ONLY valid JSON, no text, no markdown, no code blocks:
{
  "name": "surface name or format (e.g. BLB)",
  "total_width_cm": number,
  "total_height_cm": number,
  "text_zone_width_cm": number or null,
  "text_zone_height_cm": number or null,
  "has_frame": true or false,
  "dpi": number,
  "color_mode": "CMYK" or "RGB",
  "output_format": "TIF" or "PDF" or other,
  "notes": "string or null"
}
If a parameter cannot be determined set it to null."#;

/// Estimates where the photo and the copy sit in a master screenshot.
pub const ANALYZE_LAYOUT: &str = r#"You are an advertising layout analyst.
Look at this outdoor advertising banner image.
Determine how the photo and text are arranged in the layout.
Return ONLY valid JSON, no text, no markdown, no code blocks:
{
  "photo_zone": "left" or "right" or "full",
  "text_zone": "left" or "right" or "none",
  "photo_x": number from 0 to 1 (horizontal center of photo, 0.5 = center),
  "photo_y": number from 0 to 1 (vertical center of photo, 0.5 = center),
  "photo_scale": number >= 1.0 (1.0 = photo exactly covers its zone),
  "split_ratio": number from 0 to 1 (fraction of total width occupied by photo)
}
Example: photo on right half, text on left -> photo_zone "right", text_zone "left", split_ratio 0.5
Full background photo -> photo_zone "full", split_ratio 1.0"#;
