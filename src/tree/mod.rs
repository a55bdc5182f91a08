//! Synthetic code tree
//!
//! Projects, files, types, methods and fields live in one arena owned by
//! [`CodeTree`]. Parents hold the ids of the nodes they own; children hold
//! the id of their owner. A multi-project forest shares the same arena, so
//! the flat slices returned by [`CodeTree::files`], [`CodeTree::types`] and
//! [`CodeTree::methods`] already answer lookups across every sub-project
//! while [`Project::files`] keeps the ownership hierarchy for rollups.

pub mod naming;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(usize);

        impl $name {
            /// Position of the node in its arena slice
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to a [`Project`]
    ProjectId
);
arena_id!(
    /// Handle to a [`File`]
    FileId
);
arena_id!(
    /// Handle to a [`TypeNode`]
    TypeId
);
arena_id!(
    /// Handle to a [`Method`]
    MethodId
);
arena_id!(
    /// Handle to a [`Field`]
    FieldId
);

/// Size and structure metrics attached to tree nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Lines of code
    #[serde(rename = "LOC")]
    Loc,
    /// Number of statements
    #[serde(rename = "NOS")]
    Nos,
    /// Number of methods
    #[serde(rename = "NOM")]
    Nom,
    /// Number of fields
    #[serde(rename = "NOF")]
    Nof,
    /// Number of variables
    #[serde(rename = "NOV")]
    Nov,
    /// Number of classes (types)
    #[serde(rename = "NC")]
    Nc,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Loc,
        Metric::Nos,
        Metric::Nom,
        Metric::Nof,
        Metric::Nov,
        Metric::Nc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Loc => "LOC",
            Metric::Nos => "NOS",
            Metric::Nom => "NOM",
            Metric::Nof => "NOF",
            Metric::Nov => "NOV",
            Metric::Nc => "NC",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metric name → value mapping carried by every measured node
pub type MetricTable = BTreeMap<Metric, f64>;

/// Root project or sub-project
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub identifier: String,
    pub parent: Option<String>,
    pub files: Vec<FileId>,
    pub sub_projects: Vec<ProjectId>,
    pub metrics: MetricTable,
}

/// Synthetic source file
#[derive(Debug, Clone, Serialize)]
pub struct File {
    pub path: String,
    pub project: ProjectId,
    /// Total length in lines (>= 1)
    pub length: u32,
    pub types: Vec<TypeId>,
    pub metrics: MetricTable,
}

/// Type declared in a file, spanning `[start, end]`
#[derive(Debug, Clone, Serialize)]
pub struct TypeNode {
    pub qualified: String,
    pub name: String,
    pub file: FileId,
    pub start: u32,
    pub end: u32,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
    pub metrics: MetricTable,
}

/// Field declared on a single line of its type
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub qualified: String,
    pub owner: TypeId,
    pub line: u32,
}

/// Method spanning `[start, end]` inside its type
#[derive(Debug, Clone, Serialize)]
pub struct Method {
    pub name: String,
    pub qualified: String,
    pub owner: TypeId,
    pub constructor: bool,
    pub start: u32,
    pub end: u32,
    pub metrics: MetricTable,
}

/// Kinds of node a finding may be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    Method,
    Type,
    File,
}

impl LocationKind {
    pub const ALL: [LocationKind; 3] =
        [LocationKind::Method, LocationKind::Type, LocationKind::File];
}

/// Non-owning reference to a finding location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Method(MethodId),
    Type(TypeId),
    File(FileId),
}

impl Location {
    pub fn kind(&self) -> LocationKind {
        match self {
            Location::Method(_) => LocationKind::Method,
            Location::Type(_) => LocationKind::Type,
            Location::File(_) => LocationKind::File,
        }
    }
}

/// Arena of synthetic project nodes
#[derive(Debug, Clone, Serialize)]
pub struct CodeTree {
    root: ProjectId,
    projects: Vec<Project>,
    files: Vec<File>,
    types: Vec<TypeNode>,
    methods: Vec<Method>,
    fields: Vec<Field>,
    #[serde(skip)]
    paths: HashMap<String, FileId>,
}

impl CodeTree {
    /// Create a tree holding only a root project
    pub fn new(root_identifier: &str) -> Self {
        let root = Project {
            identifier: root_identifier.to_string(),
            parent: None,
            files: Vec::new(),
            sub_projects: Vec::new(),
            metrics: MetricTable::new(),
        };

        CodeTree {
            root: ProjectId(0),
            projects: vec![root],
            files: Vec::new(),
            types: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            paths: HashMap::new(),
        }
    }

    pub fn root_id(&self) -> ProjectId {
        self.root
    }

    pub fn root(&self) -> &Project {
        &self.projects[self.root.0]
    }

    /// Add a sub-project owned by `parent`, tagged with the parent identifier
    pub fn add_sub_project(&mut self, parent: ProjectId, identifier: &str) -> ProjectId {
        let id = ProjectId(self.projects.len());
        let parent_identifier = self.projects[parent.0].identifier.clone();
        self.projects.push(Project {
            identifier: identifier.to_string(),
            parent: Some(parent_identifier),
            files: Vec::new(),
            sub_projects: Vec::new(),
            metrics: MetricTable::new(),
        });
        self.projects[parent.0].sub_projects.push(id);
        id
    }

    /// True if any project in the forest already owns `path`
    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    /// Add a file to `project`; `None` if the path is already taken
    pub fn add_file(&mut self, project: ProjectId, path: &str, length: u32) -> Option<FileId> {
        if self.contains_path(path) {
            return None;
        }

        let id = FileId(self.files.len());
        self.files.push(File {
            path: path.to_string(),
            project,
            length,
            types: Vec::new(),
            metrics: MetricTable::new(),
        });
        self.paths.insert(path.to_string(), id);
        self.projects[project.0].files.push(id);
        Some(id)
    }

    /// Add a type spanning `[start, end]` to `file`
    pub fn add_type(
        &mut self,
        file: FileId,
        name: &str,
        qualified: &str,
        start: u32,
        end: u32,
    ) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(TypeNode {
            qualified: qualified.to_string(),
            name: name.to_string(),
            file,
            start,
            end,
            fields: Vec::new(),
            methods: Vec::new(),
            metrics: MetricTable::new(),
        });
        self.files[file.0].types.push(id);
        id
    }

    /// Add a field on `line` to `owner`
    pub fn add_field(&mut self, owner: TypeId, name: &str, line: u32) -> FieldId {
        let id = FieldId(self.fields.len());
        let qualified = member_identifier(&self.types[owner.0].qualified, name);
        self.fields.push(Field {
            name: name.to_string(),
            qualified,
            owner,
            line,
        });
        self.types[owner.0].fields.push(id);
        id
    }

    /// Add a method spanning `[start, end]` to `owner`
    pub fn add_method(
        &mut self,
        owner: TypeId,
        name: &str,
        constructor: bool,
        start: u32,
        end: u32,
    ) -> MethodId {
        let id = MethodId(self.methods.len());
        let qualified = member_identifier(&self.types[owner.0].qualified, name);
        self.methods.push(Method {
            name: name.to_string(),
            qualified,
            owner,
            constructor,
            start,
            end,
            metrics: MetricTable::new(),
        });
        self.types[owner.0].methods.push(id);
        id
    }

    /// True if `file` already declares a type with simple name `name`
    pub fn file_has_type(&self, file: FileId, name: &str) -> bool {
        self.files[file.0]
            .types
            .iter()
            .any(|t| self.types[t.0].name == name)
    }

    /// True if `owner` already has a field or method called `name`
    pub fn type_has_member(&self, owner: TypeId, name: &str) -> bool {
        let node = &self.types[owner.0];
        node.fields.iter().any(|f| self.fields[f.0].name == name)
            || node.methods.iter().any(|m| self.methods[m.0].name == name)
    }

    pub fn project(&self, id: ProjectId) -> &Project {
        &self.projects[id.0]
    }

    pub fn file(&self, id: FileId) -> &File {
        &self.files[id.0]
    }

    pub fn type_node(&self, id: TypeId) -> &TypeNode {
        &self.types[id.0]
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.0]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0]
    }

    pub(crate) fn project_mut(&mut self, id: ProjectId) -> &mut Project {
        &mut self.projects[id.0]
    }

    pub(crate) fn file_mut(&mut self, id: FileId) -> &mut File {
        &mut self.files[id.0]
    }

    pub(crate) fn type_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.types[id.0]
    }

    pub(crate) fn method_mut(&mut self, id: MethodId) -> &mut Method {
        &mut self.methods[id.0]
    }

    pub fn file_by_path(&self, path: &str) -> Option<&File> {
        self.paths.get(path).map(|id| &self.files[id.0])
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn types(&self) -> &[TypeNode] {
        &self.types
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of nodes of `kind` across the forest
    pub fn count(&self, kind: LocationKind) -> usize {
        match kind {
            LocationKind::Method => self.methods.len(),
            LocationKind::Type => self.types.len(),
            LocationKind::File => self.files.len(),
        }
    }

    /// Location of the `index`-th node of `kind`, if it exists
    pub fn location_at(&self, kind: LocationKind, index: usize) -> Option<Location> {
        if index >= self.count(kind) {
            return None;
        }
        Some(match kind {
            LocationKind::Method => Location::Method(MethodId(index)),
            LocationKind::Type => Location::Type(TypeId(index)),
            LocationKind::File => Location::File(FileId(index)),
        })
    }

    /// Qualified name of a location, for logs and reports
    pub fn location_name(&self, location: Location) -> &str {
        match location {
            Location::Method(id) => &self.methods[id.0].qualified,
            Location::Type(id) => &self.types[id.0].qualified,
            Location::File(id) => &self.files[id.0].path,
        }
    }
}

/// Qualified identifier of a type: `<package>.<name>`
pub fn type_identifier(package: &str, name: &str) -> String {
    format!("{}.{}", package, name)
}

/// Qualified identifier of a field or method: `<type>#<name>`
pub fn member_identifier(owner: &str, name: &str) -> String {
    format!("{}#{}", owner, name)
}
