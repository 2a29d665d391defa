//! In-memory Android manifest.
//!
//! The manifest is kept as a small element tree. Only the operations the SDK
//! build path needs are exposed; the on-disk encoding is plain JSON of the
//! tree (`AndroidManifest.json`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MANIFEST_ELEMENT: &str = "manifest";
pub const APPLICATION_ELEMENT: &str = "application";
pub const USES_SDK_ELEMENT: &str = "uses-sdk";
pub const SDK_LIBRARY_ELEMENT: &str = "sdk-library";
pub const PROPERTY_ELEMENT: &str = "property";

pub const PACKAGE_ATTRIBUTE: &str = "package";
pub const VERSION_NAME_ATTRIBUTE: &str = "android:versionName";
pub const VERSION_CODE_ATTRIBUTE: &str = "android:versionCode";
pub const MIN_SDK_VERSION_ATTRIBUTE: &str = "android:minSdkVersion";
pub const NAME_ATTRIBUTE: &str = "android:name";
pub const VERSION_MAJOR_ATTRIBUTE: &str = "android:versionMajor";
pub const VALUE_ATTRIBUTE: &str = "android:value";

/// Property carrying the SDK patch version, which the composite
/// `versionMajor` does not encode.
pub const SDK_PATCH_VERSION_PROPERTY_NAME: &str = "com.android.vending.sdk.version.patch";

/// Lowest platform API level able to host the SDK sandbox.
pub const SDK_SANDBOX_MIN_VERSION: i32 = 33;

/// Platform default when `<uses-sdk>` declares no minimum.
pub const DEFAULT_MIN_SDK_VERSION: i32 = 1;

/// Errors raised while reading or editing a manifest.
///
/// These indicate a manifest that upstream validation should never have let
/// through; they are not recoverable by correcting user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest root element must be <manifest>, found <{found}>")]
    UnexpectedRoot { found: String },

    #[error("manifest is missing the <{element}> element")]
    MissingElement { element: &'static str },

    #[error("attribute '{attribute}' on <{element}> is not a decimal integer")]
    NotAnInteger {
        element: &'static str,
        attribute: &'static str,
    },
}

/// Attribute value: either a decimal integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Decimal(i32),
    String(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Decimal(_) => None,
        }
    }

    /// Integer view; numeric strings are accepted, as the platform does.
    pub fn as_decimal(&self) -> Option<i32> {
        match self {
            Self::Decimal(v) => Some(*v),
            Self::String(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// One manifest element with attributes and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Returns the first child named `name`, creating it if absent.
    pub fn child_or_insert(&mut self, name: &str) -> &mut XmlElement {
        let idx = match self.children.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.children.push(XmlElement::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }
}

/// Android manifest rooted at a `<manifest>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "XmlElement", into = "XmlElement")]
pub struct AndroidManifest {
    root: XmlElement,
}

impl TryFrom<XmlElement> for AndroidManifest {
    type Error = ManifestError;

    fn try_from(root: XmlElement) -> Result<Self, Self::Error> {
        if root.name != MANIFEST_ELEMENT {
            return Err(ManifestError::UnexpectedRoot { found: root.name });
        }
        Ok(Self { root })
    }
}

impl From<AndroidManifest> for XmlElement {
    fn from(manifest: AndroidManifest) -> Self {
        manifest.root
    }
}

impl AndroidManifest {
    /// Minimal manifest: `<manifest package=…><application/></manifest>`.
    pub fn new(package_name: &str) -> Self {
        Self {
            root: XmlElement::new(MANIFEST_ELEMENT)
                .with_attribute(PACKAGE_ATTRIBUTE, package_name)
                .with_child(XmlElement::new(APPLICATION_ELEMENT)),
        }
    }

    pub fn with_min_sdk_version(mut self, min_sdk_version: i32) -> Self {
        self.set_min_sdk_version(min_sdk_version);
        self
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn package_name(&self) -> Option<&str> {
        self.root.attribute(PACKAGE_ATTRIBUTE).and_then(|v| v.as_str())
    }

    pub fn set_package_name(&mut self, package_name: &str) {
        self.root.set_attribute(PACKAGE_ATTRIBUTE, package_name);
    }

    pub fn version_name(&self) -> Option<&str> {
        self.root
            .attribute(VERSION_NAME_ATTRIBUTE)
            .and_then(|v| v.as_str())
    }

    pub fn set_version_name(&mut self, version_name: &str) {
        self.root.set_attribute(VERSION_NAME_ATTRIBUTE, version_name);
    }

    pub fn version_code(&self) -> Option<i32> {
        self.root
            .attribute(VERSION_CODE_ATTRIBUTE)
            .and_then(|v| v.as_decimal())
    }

    pub fn set_version_code(&mut self, version_code: i32) {
        self.root.set_attribute(VERSION_CODE_ATTRIBUTE, version_code);
    }

    /// Minimum platform version declared on `<uses-sdk>`, if any.
    pub fn min_sdk_version(&self) -> Result<Option<i32>, ManifestError> {
        let Some(value) = self
            .root
            .child(USES_SDK_ELEMENT)
            .and_then(|uses_sdk| uses_sdk.attribute(MIN_SDK_VERSION_ATTRIBUTE))
        else {
            return Ok(None);
        };
        value
            .as_decimal()
            .map(Some)
            .ok_or(ManifestError::NotAnInteger {
                element: USES_SDK_ELEMENT,
                attribute: MIN_SDK_VERSION_ATTRIBUTE,
            })
    }

    /// Minimum platform version in effect, applying the platform default.
    pub fn effective_min_sdk_version(&self) -> Result<i32, ManifestError> {
        Ok(self.min_sdk_version()?.unwrap_or(DEFAULT_MIN_SDK_VERSION))
    }

    pub fn set_min_sdk_version(&mut self, min_sdk_version: i32) {
        self.root
            .child_or_insert(USES_SDK_ELEMENT)
            .set_attribute(MIN_SDK_VERSION_ATTRIBUTE, min_sdk_version);
    }

    pub fn application(&self) -> Option<&XmlElement> {
        self.root.child(APPLICATION_ELEMENT)
    }

    fn application_mut(&mut self) -> Result<&mut XmlElement, ManifestError> {
        self.root
            .child_mut(APPLICATION_ELEMENT)
            .ok_or(ManifestError::MissingElement {
                element: APPLICATION_ELEMENT,
            })
    }

    pub fn sdk_library_elements(&self) -> Vec<&XmlElement> {
        self.application()
            .map(|app| app.children_named(SDK_LIBRARY_ELEMENT).collect())
            .unwrap_or_default()
    }

    /// Write the single `<sdk-library>` element, replacing any existing one.
    pub fn set_sdk_library_element(
        &mut self,
        sdk_package_name: &str,
        version_major: i32,
    ) -> Result<(), ManifestError> {
        let application = self.application_mut()?;
        application.children.retain(|c| c.name != SDK_LIBRARY_ELEMENT);
        application.children.push(
            XmlElement::new(SDK_LIBRARY_ELEMENT)
                .with_attribute(NAME_ATTRIBUTE, sdk_package_name)
                .with_attribute(VERSION_MAJOR_ATTRIBUTE, version_major),
        );
        Ok(())
    }

    /// Value of the `<property>` named `name` under `<application>`.
    pub fn property(&self, name: &str) -> Option<&AttributeValue> {
        self.application()?
            .children_named(PROPERTY_ELEMENT)
            .find(|p| p.attribute(NAME_ATTRIBUTE).and_then(|v| v.as_str()) == Some(name))
            .and_then(|p| p.attribute(VALUE_ATTRIBUTE))
    }

    /// Write a `<property>` under `<application>`, replacing one of the same name.
    pub fn set_property(
        &mut self,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), ManifestError> {
        let application = self.application_mut()?;
        application.children.retain(|c| {
            !(c.name == PROPERTY_ELEMENT
                && c.attribute(NAME_ATTRIBUTE).and_then(|v| v.as_str()) == Some(name))
        });
        application.children.push(
            XmlElement::new(PROPERTY_ELEMENT)
                .with_attribute(NAME_ATTRIBUTE, name)
                .with_attribute(VALUE_ATTRIBUTE, value),
        );
        Ok(())
    }

    pub fn sdk_patch_version_property(&self) -> Option<i32> {
        self.property(SDK_PATCH_VERSION_PROPERTY_NAME)
            .and_then(|v| v.as_decimal())
    }
}
