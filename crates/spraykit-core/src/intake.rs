//! Archive intake: locate one complete geometry set inside an upload.

use bytes::Bytes;
use log::{debug, info, warn};

use crate::container::{self, Member};
use crate::error::{IntakeError, Result};
use crate::formats;

/// The four files a shapefile geometry set cannot do without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Geometry,
    Index,
    Attributes,
    Projection,
}

impl Component {
    /// Every required component, in reporting order.
    pub const REQUIRED: [Component; 4] = [
        Component::Geometry,
        Component::Index,
        Component::Attributes,
        Component::Projection,
    ];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Component::Geometry => ".shp",
            Component::Index => ".shx",
            Component::Attributes => ".dbf",
            Component::Projection => ".prj",
        }
    }
}

/// Extension of the optional code-page companion.
pub const CODE_PAGE_EXTENSION: &str = ".cpg";

/// A complete set of companion files sharing one base name.
///
/// Payloads are reference-counted, so derived sets share untouched
/// components with their source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometrySet {
    base_name: String,
    geometry: Bytes,
    index: Bytes,
    attributes: Bytes,
    projection: Bytes,
    code_page: Option<Bytes>,
}

impl GeometrySet {
    pub fn new(
        base_name: impl Into<String>,
        geometry: impl Into<Bytes>,
        index: impl Into<Bytes>,
        attributes: impl Into<Bytes>,
        projection: impl Into<Bytes>,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            geometry: geometry.into(),
            index: index.into(),
            attributes: attributes.into(),
            projection: projection.into(),
            code_page: None,
        }
    }

    #[must_use]
    pub fn with_code_page(mut self, code_page: impl Into<Bytes>) -> Self {
        self.code_page = Some(code_page.into());
        self
    }

    /// A copy of this set with a new attribute table and every other
    /// component unchanged.
    #[must_use]
    pub fn with_attributes(&self, attributes: impl Into<Bytes>) -> Self {
        Self {
            attributes: attributes.into(),
            ..self.clone()
        }
    }

    /// A copy of this set under a different base name.
    #[must_use]
    pub fn renamed(&self, base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            ..self.clone()
        }
    }

    /// Shared base name, including any folder prefix from the archive.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Base name without folders.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.base_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.base_name)
    }

    #[must_use]
    pub fn component(&self, component: Component) -> &Bytes {
        match component {
            Component::Geometry => &self.geometry,
            Component::Index => &self.index,
            Component::Attributes => &self.attributes,
            Component::Projection => &self.projection,
        }
    }

    #[must_use]
    pub fn code_page(&self) -> Option<&Bytes> {
        self.code_page.as_ref()
    }
}

/// Unpack an uploaded archive and select its geometry set.
///
/// # Errors
///
/// Fails with [`IntakeError::UnsupportedInput`] when the payload is not a zip
/// archive, [`IntakeError::NoGeometryFile`] when it holds no `.shp` member and
/// [`IntakeError::IncompleteGeometrySet`] when companions are missing.
pub fn intake(archive: &[u8]) -> Result<GeometrySet> {
    formats::ensure_readable(archive)?;
    let members = container::extract_all(archive)?;
    debug!("Archive holds {} file member(s)", members.len());
    select_geometry_set(&members)
}

/// Select the first geometry set among already extracted members.
///
/// # Errors
///
/// See [`intake`].
pub fn select_geometry_set(members: &[Member]) -> Result<GeometrySet> {
    let candidates: Vec<(&str, &str, &Member)> = members
        .iter()
        .filter(|m| !is_platform_artifact(&m.name))
        .filter_map(|m| split_extension(&m.name).map(|(base, ext)| (base, ext, m)))
        .collect();

    let mut geometry_bases = candidates
        .iter()
        .filter(|(_, ext, _)| ext.eq_ignore_ascii_case(Component::Geometry.extension()))
        .map(|(base, _, _)| *base);
    let Some(base_name) = geometry_bases.next() else {
        return Err(IntakeError::NoGeometryFile.into());
    };
    let ignored: Vec<&str> = geometry_bases.filter(|b| *b != base_name).collect();
    if !ignored.is_empty() {
        warn!(
            "Archive holds {} geometry sets; using '{base_name}' and ignoring {}",
            ignored.len() + 1,
            ignored.join(", ")
        );
    }

    let find = |extension: &str| -> Option<Bytes> {
        candidates
            .iter()
            .find(|(base, ext, _)| *base == base_name && ext.eq_ignore_ascii_case(extension))
            .map(|(_, _, m)| m.data.clone())
    };

    let payloads = Component::REQUIRED.map(|c| find(c.extension()));
    let [Some(geometry), Some(index), Some(attributes), Some(projection)] = &payloads else {
        let missing = Component::REQUIRED
            .iter()
            .zip(&payloads)
            .filter(|(_, payload)| payload.is_none())
            .map(|(component, _)| component.extension().to_string())
            .collect();
        return Err(IntakeError::IncompleteGeometrySet {
            base_name: base_name.to_string(),
            missing,
        }
        .into());
    };

    let mut set = GeometrySet::new(
        base_name,
        geometry.clone(),
        index.clone(),
        attributes.clone(),
        projection.clone(),
    );
    if let Some(code_page) = find(CODE_PAGE_EXTENSION) {
        set = set.with_code_page(code_page);
    }

    info!("Selected geometry set '{base_name}'");
    Ok(set)
}

/// Split `folder/name.ext` into `("folder/name", ".ext")`.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    let dot = name[file_start..].rfind('.')? + file_start;
    if dot == file_start {
        return None;
    }
    Some((&name[..dot], &name[dot..]))
}

/// Resource forks and folders added by macOS archivers.
fn is_platform_artifact(name: &str) -> bool {
    name.starts_with("__MACOSX/")
        || name
            .rsplit('/')
            .next()
            .is_some_and(|file| file.starts_with("._"))
}
