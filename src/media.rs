use serde::{Deserialize, Serialize};

/// Rating levels for posts.
///
/// Ordered so that SAFE < UNRATED < QUESTIONABLE < EXPLICIT, which lets a
/// plain integer comparison select the desired posts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RatingLevel {
    Safe,
    #[default]
    Unrated,
    Questionable,
    Explicit,
}

impl RatingLevel {
    pub const ALL: [RatingLevel; 4] = [
        RatingLevel::Safe,
        RatingLevel::Unrated,
        RatingLevel::Questionable,
        RatingLevel::Explicit,
    ];

    pub fn value(self) -> u16 {
        match self {
            RatingLevel::Safe => 0,
            RatingLevel::Unrated => 1,
            RatingLevel::Questionable => 50,
            RatingLevel::Explicit => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RatingLevel::Safe => "safe",
            RatingLevel::Unrated => "unrated",
            RatingLevel::Questionable => "questionable",
            RatingLevel::Explicit => "explicit",
        }
    }

    /// Select a rating level by label, ignoring surrounding whitespace and letter case.
    pub fn select(label: &str) -> Option<RatingLevel> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Audio,
    Image,
    Video,
}

impl MediaCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Audio => "audio",
            MediaCategory::Image => "image",
            MediaCategory::Video => "video",
        }
    }
}

/// Content type of a post's file following the MIME convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SupportedMediaType {
    // image
    Avif,
    Bmp,
    Gif,
    Jpeg,
    Png,
    Webp,
    Tiff,
    // audio
    Mp3,
    Wav,
    Wav2,
    Wav3,
    // video
    Mp4,
    Mpeg,
    Webm,
}

struct MediaTypeInfo {
    desc: &'static str,
    extensions: &'static [&'static str],
    category: MediaCategory,
    subtype: &'static str,
    suffix: Option<&'static str>,
}

const fn media(
    desc: &'static str,
    extensions: &'static [&'static str],
    category: MediaCategory,
    subtype: &'static str,
) -> MediaTypeInfo {
    MediaTypeInfo {
        desc,
        extensions,
        category,
        subtype,
        suffix: None,
    }
}

impl SupportedMediaType {
    pub const ALL: [SupportedMediaType; 14] = [
        SupportedMediaType::Avif,
        SupportedMediaType::Bmp,
        SupportedMediaType::Gif,
        SupportedMediaType::Jpeg,
        SupportedMediaType::Png,
        SupportedMediaType::Webp,
        SupportedMediaType::Tiff,
        SupportedMediaType::Mp3,
        SupportedMediaType::Wav,
        SupportedMediaType::Wav2,
        SupportedMediaType::Wav3,
        SupportedMediaType::Mp4,
        SupportedMediaType::Mpeg,
        SupportedMediaType::Webm,
    ];

    fn info(self) -> MediaTypeInfo {
        use MediaCategory::*;
        match self {
            SupportedMediaType::Avif => media("AVIF image", &["avif"], Image, "avif"),
            SupportedMediaType::Bmp => media("Windows Bitmap Graphics", &["bmp"], Image, "bmp"),
            SupportedMediaType::Gif => media("GIF", &["gif"], Image, "gif"),
            SupportedMediaType::Jpeg => media("JPEG image", &["jpg", "jpeg"], Image, "jpeg"),
            SupportedMediaType::Png => media("PNG", &["png"], Image, "png"),
            SupportedMediaType::Webp => media("WEBP image", &["webp"], Image, "webp"),
            SupportedMediaType::Tiff => media("TIFF image", &["tif", "tiff"], Image, "tiff"),
            SupportedMediaType::Mp3 => media("MP3 audio", &["mp3", "mpeg"], Audio, "mpeg"),
            SupportedMediaType::Wav => media("WAV audio", &["wav"], Audio, "vnd.wav"),
            SupportedMediaType::Wav2 => media("WAV audio", &["wav"], Audio, "vnd.wave"),
            SupportedMediaType::Wav3 => media("WAV audio", &["wav"], Audio, "wave"),
            SupportedMediaType::Mp4 => media("MP4 video", &["mp4"], Video, "mp4"),
            SupportedMediaType::Mpeg => media("MPEG video", &["mpeg"], Video, "mpeg"),
            SupportedMediaType::Webm => media("WEBM video", &["webm"], Video, "webm"),
        }
    }

    pub fn desc(self) -> &'static str {
        self.info().desc
    }

    pub fn extensions(self) -> &'static [&'static str] {
        self.info().extensions
    }

    pub fn category(self) -> MediaCategory {
        self.info().category
    }

    /// e.g. `image/png`, or `image/svg+xml` for types with a suffix
    pub fn mimetype(self) -> String {
        let info = self.info();
        let mut template = format!("{}/{}", info.category.as_str(), info.subtype);
        if let Some(suffix) = info.suffix {
            template.push('+');
            template.push_str(suffix);
        }
        template
    }

    /// First supported type whose MIME template equals `template`.
    pub fn find(template: &str) -> Option<SupportedMediaType> {
        Self::ALL
            .into_iter()
            .find(|media_type| media_type.mimetype() == template)
    }

    pub fn supported_mimetypes() -> String {
        Self::ALL
            .iter()
            .map(|media_type| media_type.mimetype())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_select_ignores_case() {
        assert_eq!(RatingLevel::select("SAFE"), Some(RatingLevel::Safe));
        assert_eq!(RatingLevel::select(" Explicit "), Some(RatingLevel::Explicit));
        assert_eq!(RatingLevel::select("not_a_label"), None);
    }

    #[test]
    fn test_rating_values_are_ordered() {
        let values = RatingLevel::ALL.map(RatingLevel::value);
        assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_find_mimetype() {
        assert_eq!(SupportedMediaType::find("image/png"), Some(SupportedMediaType::Png));
        assert_eq!(SupportedMediaType::find("audio/mpeg"), Some(SupportedMediaType::Mp3));
        assert_eq!(SupportedMediaType::find("video/mpeg"), Some(SupportedMediaType::Mpeg));
        assert_eq!(SupportedMediaType::find("image/svg+xml"), None);
        assert_eq!(SupportedMediaType::Jpeg.extensions(), &["jpg", "jpeg"]);
        assert_eq!(SupportedMediaType::Wav2.category(), MediaCategory::Audio);
    }
}
