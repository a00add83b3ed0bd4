use mkpro_core::services::{
    DEFAULT_FACEBOOK_MESSAGE, DEFAULT_INSTAGRAM_CAPTION, DEFAULT_INSTAGRAM_IMAGE,
    DEFAULT_TEST_MESSAGE,
};
use mkpro_core::Tab;

/// Every text field a view lets the user edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ChatText,

    BrandName,
    BrandTone,
    BrandContext,

    FacebookMessage,
    FacebookImage,
    InstagramCaption,
    InstagramImage,

    ModelName,
    Temperature,
    RulesMd,
    RulesJson,
    SuperKeyword,
    SuperAllowList,
    PasswordCurrent,
    PasswordNew,
    PasswordConfirm,
    TestTo,
    TestText,
    DsName,
    DsUrl,
    DsHeaders,

    LeadText,
    PageSize,

    Search,
    QuickReply,
    MetaTitle,
    MetaColor,
    MetaColumn,
    MetaNumber,
    MetaTags,
    MetaNotes,
}

impl Field {
    /// Focus order per tab.
    pub fn for_tab(tab: Tab) -> &'static [Field] {
        match tab {
            Tab::TeamChat => &[Field::ChatText],
            Tab::Brands => &[Field::BrandName, Field::BrandTone, Field::BrandContext],
            Tab::Channels => &[
                Field::FacebookMessage,
                Field::FacebookImage,
                Field::InstagramCaption,
                Field::InstagramImage,
            ],
            Tab::WaAdmin => &[
                Field::ModelName,
                Field::Temperature,
                Field::RulesMd,
                Field::RulesJson,
                Field::SuperKeyword,
                Field::SuperAllowList,
                Field::PasswordCurrent,
                Field::PasswordNew,
                Field::PasswordConfirm,
                Field::TestTo,
                Field::TestText,
                Field::DsName,
                Field::DsUrl,
                Field::DsHeaders,
            ],
            Tab::Leads => &[Field::LeadText, Field::PageSize],
            Tab::WaInbox => &[
                Field::Search,
                Field::QuickReply,
                Field::MetaTitle,
                Field::MetaColor,
                Field::MetaColumn,
                Field::MetaNumber,
                Field::MetaTags,
                Field::MetaNotes,
            ],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::ChatText => "Message",
            Field::BrandName => "Name",
            Field::BrandTone => "Tone",
            Field::BrandContext => "Context",
            Field::FacebookMessage => "Facebook message",
            Field::FacebookImage => "Facebook image URL",
            Field::InstagramCaption => "Instagram caption",
            Field::InstagramImage => "Instagram image URL",
            Field::ModelName => "Model",
            Field::Temperature => "Temperature",
            Field::RulesMd => "Rules (markdown)",
            Field::RulesJson => "Rules (JSON)",
            Field::SuperKeyword => "Admin keyword",
            Field::SuperAllowList => "Admin numbers (CSV)",
            Field::PasswordCurrent => "Current password",
            Field::PasswordNew => "New password",
            Field::PasswordConfirm => "Repeat password",
            Field::TestTo => "Test to",
            Field::TestText => "Test text",
            Field::DsName => "Datasource name",
            Field::DsUrl => "Datasource URL",
            Field::DsHeaders => "Headers (JSON)",
            Field::LeadText => "Lead message",
            Field::PageSize => "Page size",
            Field::Search => "Search",
            Field::QuickReply => "Quick reply",
            Field::MetaTitle => "Title",
            Field::MetaColor => "Color",
            Field::MetaColumn => "Column",
            Field::MetaNumber => "Number",
            Field::MetaTags => "Tags (CSV)",
            Field::MetaNotes => "Notes",
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(
            self,
            Field::ChatText
                | Field::BrandContext
                | Field::RulesMd
                | Field::RulesJson
                | Field::LeadText
                | Field::MetaNotes
        )
    }

    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            Field::PasswordCurrent | Field::PasswordNew | Field::PasswordConfirm
        )
    }

    /// Only editable while a chat is open.
    pub fn needs_open_chat(&self) -> bool {
        matches!(
            self,
            Field::QuickReply
                | Field::MetaTitle
                | Field::MetaColor
                | Field::MetaColumn
                | Field::MetaNumber
                | Field::MetaTags
                | Field::MetaNotes
        )
    }
}

/// Inputs that only live in the terminal and are passed to the controllers
/// as arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forms {
    pub facebook_message: String,
    pub facebook_image: String,
    pub instagram_caption: String,
    pub instagram_image: String,
    pub password_current: String,
    pub test_to: String,
    pub test_text: String,
    pub search: String,
    pub quick_reply: String,
}

impl Default for Forms {
    fn default() -> Self {
        Self {
            facebook_message: DEFAULT_FACEBOOK_MESSAGE.to_string(),
            facebook_image: String::new(),
            instagram_caption: DEFAULT_INSTAGRAM_CAPTION.to_string(),
            instagram_image: DEFAULT_INSTAGRAM_IMAGE.to_string(),
            password_current: String::new(),
            test_to: String::new(),
            test_text: DEFAULT_TEST_MESSAGE.to_string(),
            search: String::new(),
            quick_reply: String::new(),
        }
    }
}

/// `•` per character.
pub fn mask(value: &str) -> String {
    "•".repeat(value.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tab_has_fields() {
        for tab in Tab::all() {
            assert!(!Field::for_tab(*tab).is_empty(), "{:?}", tab);
        }
    }

    #[test]
    fn test_fields_are_unique_across_tabs() {
        let mut seen = std::collections::HashSet::new();
        for tab in Tab::all() {
            for field in Field::for_tab(*tab) {
                assert!(seen.insert(*field), "{:?} listed twice", field);
            }
        }
    }

    #[test]
    fn test_secret_fields_are_masked() {
        assert!(Field::PasswordNew.is_secret());
        assert!(!Field::TestTo.is_secret());
        assert_eq!(mask("añb"), "•••");
    }

    #[test]
    fn test_form_defaults() {
        let forms = Forms::default();
        assert_eq!(forms.instagram_image, DEFAULT_INSTAGRAM_IMAGE);
        assert!(forms.facebook_image.is_empty());
        assert_eq!(forms.test_text, DEFAULT_TEST_MESSAGE);
    }
}
