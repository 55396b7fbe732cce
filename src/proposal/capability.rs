use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind tag of a member or container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Form,
    FormField,
    ValueField,
    Button,
    GroupBox,
    TabBox,
    TabPage,
    TableField,
    Table,
    Column,
    Menu,
    CodeType,
    Code,
}

impl Capability {
    pub const ALL: [Capability; 13] = [
        Capability::Form,
        Capability::FormField,
        Capability::ValueField,
        Capability::Button,
        Capability::GroupBox,
        Capability::TabBox,
        Capability::TabPage,
        Capability::TableField,
        Capability::Table,
        Capability::Column,
        Capability::Menu,
        Capability::CodeType,
        Capability::Code,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Capability::Form => "form",
            Capability::FormField => "form-field",
            Capability::ValueField => "value-field",
            Capability::Button => "button",
            Capability::GroupBox => "group-box",
            Capability::TabBox => "tab-box",
            Capability::TabPage => "tab-page",
            Capability::TableField => "table-field",
            Capability::Table => "table",
            Capability::Column => "column",
            Capability::Menu => "menu",
            Capability::CodeType => "code-type",
            Capability::Code => "code",
        }
    }

    /// Direct generalization
    pub fn parent(self) -> Option<Capability> {
        match self {
            Capability::ValueField
            | Capability::Button
            | Capability::GroupBox
            | Capability::TabBox
            | Capability::TableField => Some(Capability::FormField),
            Capability::TabPage => Some(Capability::GroupBox),
            _ => None,
        }
    }

    /// True if `self` is `other` or a specialization of it
    pub fn is_a(self, other: Capability) -> bool {
        let mut current = Some(self);
        while let Some(capability) = current {
            if capability == other {
                return true;
            }
            current = capability.parent();
        }
        false
    }

    /// Child capabilities a container of this kind accepts
    pub fn accepts(self) -> &'static [Capability] {
        match self {
            Capability::Form | Capability::GroupBox | Capability::TabPage => {
                &[Capability::FormField, Capability::Menu]
            }
            Capability::TabBox => &[Capability::TabPage, Capability::Menu],
            Capability::TableField => &[Capability::Table, Capability::Menu],
            Capability::Table => &[Capability::Column, Capability::Menu],
            Capability::ValueField | Capability::Button | Capability::Menu => &[Capability::Menu],
            Capability::CodeType | Capability::Code => &[Capability::Code],
            Capability::FormField | Capability::Column => &[],
        }
    }

    /// True if a container of this kind takes a child of kind `child`
    pub fn accepts_child(self, child: Capability) -> bool {
        self.accepts().iter().any(|accepted| child.is_a(*accepted))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|capability| capability.name() == s)
            .ok_or_else(|| format!("unknown capability {:?}", s))
    }
}
