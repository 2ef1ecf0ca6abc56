//! Localized text for the prompts and notices the controller shows.

use std::{borrow::Cow, fmt, str::FromStr};

const EN_US: &[(TextKey, &str)] = &[
    (TextKey::ExportTo, "Export to"),
    (TextKey::ExportSucceeded, "Export succeeded"),
    (TextKey::ExportFailed, "Export failed: {0}"),
];

const ZH_CN: &[(TextKey, &str)] = &[
    (TextKey::ExportTo, "导出至"),
    (TextKey::ExportSucceeded, "导出成功"),
    (TextKey::ExportFailed, "导出失败：{0}"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    EnUs,
    ZhCn,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhCn => "zh-CN",
        }
    }

    fn strings(self) -> &'static [(TextKey, &'static str)] {
        match self {
            Self::EnUs => EN_US,
            Self::ZhCn => ZH_CN,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale '{0}'")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Self::EnUs),
            "zh" | "zh-cn" | "zh-hans" => Ok(Self::ZhCn),
            _ => Err(UnsupportedLocale(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    ExportTo,
    ExportSucceeded,
    /// Takes the failure reason as `{0}`.
    ExportFailed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Localizer {
    locale: Locale,
}

impl Localizer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Looks up `key` in the active locale, falling back to English.
    pub fn text(&self, key: TextKey) -> &'static str {
        lookup(self.locale, key)
            .or_else(|| lookup(Locale::EnUs, key))
            .unwrap_or_default()
    }

    pub fn format(&self, key: TextKey, args: &[&str]) -> String {
        render_template(self.text(key), args).into_owned()
    }
}

fn lookup(locale: Locale, key: TextKey) -> Option<&'static str> {
    locale
        .strings()
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, text)| *text)
}

fn render_template<'a>(template: &'a str, args: &[&str]) -> Cow<'a, str> {
    if args.is_empty() || !template.contains('{') {
        return Cow::Borrowed(template);
    }

    let mut current: Cow<'a, str> = Cow::Borrowed(template);
    for (idx, value) in args.iter().enumerate() {
        let placeholder = format!("{{{idx}}}");
        if current.contains(&placeholder) {
            current = Cow::Owned(current.replace(&placeholder, value));
        }
    }
    current
}
