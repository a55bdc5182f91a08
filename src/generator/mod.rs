//! Synthetic project generation
//!
//! Both generators share [`ProjectBuilder`], which fills one project with
//! packages, files, types, fields and methods. [`SimpleProjectGenerator`]
//! runs it once on the root project; [`MultiProjectGenerator`] runs it once
//! per sub-project in the same arena.
//!
//! # Layout guarantees
//!
//! - Types tile `[2, file.length]`: the first starts at line 2, each next
//!   one starts right after the previous end, and the last ends on the last
//!   line of the file. A file may hold fewer types than sampled when its
//!   remaining lines run out.
//! - Fields take consecutive lines after the type header; methods follow
//!   without overlap and keep coming until the type's last line is covered.
//!   The final method is clamped to the type's end.

mod multi;
mod simple;

pub use multi::MultiProjectGenerator;
pub use simple::SimpleProjectGenerator;

use crate::config::VerifierConfig;
use crate::error::{Result, VerifierError};
use crate::sampler::Triangular;
use crate::tree::naming;
use crate::tree::{type_identifier, CodeTree, FileId, ProjectId, TypeId};
use rand::{Rng, RngCore};
use tracing::debug;

/// Identifier of the root project
pub const ROOT_PROJECT: &str = "Project:Test";

/// Probability that a generated method is a constructor
pub const CONSTRUCTOR_PROBABILITY: f64 = 0.10;

/// Redraws allowed for one file slot before giving up
const MAX_PATH_ATTEMPTS: usize = 256;

/// `(min, mode, max)` line-size triples used by a generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeProfile {
    pub file_length: (f64, f64, f64),
    pub method_size: (f64, f64, f64),
}

impl SizeProfile {
    /// Profile for single-project runs
    pub const SINGLE: SizeProfile = SizeProfile {
        file_length: (300.0, 700.0, 3000.0),
        method_size: (1.0, 5.0, 25.0),
    };

    /// Profile for files of multi-project sub-projects
    pub const MULTI: SizeProfile = SizeProfile {
        file_length: (300.0, 700.0, 1000.0),
        method_size: (1.0, 5.0, 25.0),
    };
}

/// Builds a complete synthetic tree
pub trait ProjectGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Result<CodeTree>;
}

/// Pick the generator matching `config.multi_project`
pub fn generator_for(config: &VerifierConfig) -> Box<dyn ProjectGenerator + '_> {
    if config.multi_project {
        Box::new(MultiProjectGenerator::new(config))
    } else {
        Box::new(SimpleProjectGenerator::new(config))
    }
}

/// Distributions for one project, validated once up front
pub(crate) struct ProjectBuilder<'a> {
    extension: &'a str,
    namespaces: Triangular,
    files: Triangular,
    types: Triangular,
    fields: Triangular,
    methods: Triangular,
    file_length: Triangular,
    method_size: Triangular,
}

impl<'a> ProjectBuilder<'a> {
    pub(crate) fn new(config: &'a VerifierConfig, profile: SizeProfile) -> Result<Self> {
        let (fmin, fmode, fmax) = profile.file_length;
        let (mmin, mmode, mmax) = profile.method_size;
        Ok(ProjectBuilder {
            extension: &config.file_extension,
            namespaces: Triangular::for_count(config.max_namespaces)?,
            files: Triangular::for_count(config.max_files_per_project)?,
            types: Triangular::for_count(config.max_types_per_file)?,
            fields: Triangular::for_count(config.max_fields_per_type)?,
            methods: Triangular::for_count(config.max_methods_per_type)?,
            file_length: Triangular::new(fmin, fmode, fmax)?,
            method_size: Triangular::new(mmin, mmode, mmax)?,
        })
    }

    /// Fill `project` with packages and their files
    pub(crate) fn populate<R: Rng + ?Sized>(
        &self,
        tree: &mut CodeTree,
        project: ProjectId,
        rng: &mut R,
    ) -> Result<()> {
        let count = self.namespaces.sample(rng) as usize;
        let packages = naming::namespace_list(rng, count);

        for package in &packages {
            let num_files = self.files.sample(rng);
            for _ in 0..num_files {
                self.generate_file(tree, project, package, rng)?;
            }
        }

        debug!(
            project = %tree.project(project).identifier,
            packages = packages.len(),
            files = tree.project(project).files.len(),
            "populated project"
        );
        Ok(())
    }

    fn generate_file<R: Rng + ?Sized>(
        &self,
        tree: &mut CodeTree,
        project: ProjectId,
        package: &str,
        rng: &mut R,
    ) -> Result<FileId> {
        let dir = package.replace('.', "/");
        let length = self.file_length.sample(rng);

        let mut attempts = 0;
        let file = loop {
            let path = format!("/{}/{}.{}", dir, naming::file_name(rng), self.extension);
            if let Some(id) = tree.add_file(project, &path, length) {
                break id;
            }
            attempts += 1;
            debug!(path = %path, "path collision, regenerating file slot");
            if attempts >= MAX_PATH_ATTEMPTS {
                return Err(VerifierError::InvalidConfig(format!(
                    "could not find a free file name in package {} after {} attempts",
                    package, attempts
                )));
            }
        };

        let num_types = self.types.sample(rng);
        self.layout_types(tree, file, package, length, num_types, rng)?;
        Ok(file)
    }

    /// Partition `[2, length]` into at most `num_types` contiguous types
    fn layout_types<R: Rng + ?Sized>(
        &self,
        tree: &mut CodeTree,
        file: FileId,
        package: &str,
        length: u32,
        num_types: u32,
        rng: &mut R,
    ) -> Result<()> {
        let mut start = 2;

        for j in 0..num_types {
            // a slot needs two lines, otherwise start == end
            if start >= length {
                break;
            }

            let types_left = num_types - j;
            let end = if types_left == 1 {
                length
            } else {
                let share = ((length - start + 1) / types_left).max(2);
                let width = Triangular::new(2.0, f64::from(share), f64::from(2 * share - 2))?
                    .sample(rng);
                let end = start + width - 1;
                // too few lines would be left for another type
                if end + 2 > length {
                    length
                } else {
                    end
                }
            };

            let name = naming::disambiguate(&naming::type_name(rng), |n| {
                tree.file_has_type(file, n)
            });
            let qualified = type_identifier(package, &name);
            let ty = tree.add_type(file, &name, &qualified, start, end);
            self.populate_type(tree, ty, start, end, rng)?;

            if end == length {
                break;
            }
            start = end + 1;
        }

        Ok(())
    }

    fn populate_type<R: Rng + ?Sized>(
        &self,
        tree: &mut CodeTree,
        ty: TypeId,
        start: u32,
        end: u32,
        rng: &mut R,
    ) -> Result<()> {
        let mut last_line = start;

        let num_fields = self.fields.sample(rng);
        for _ in 0..num_fields {
            let line = last_line + 1;
            if line > end {
                break;
            }
            let name =
                naming::disambiguate(&naming::field_name(rng), |n| tree.type_has_member(ty, n));
            tree.add_field(ty, &name, line);
            last_line = line;
        }

        let num_methods = self.methods.sample(rng);
        let mut generated = 0;
        while generated < num_methods || last_line < end {
            let s = last_line + 1;
            if s > end {
                break;
            }
            let size = self.method_size.sample(rng);
            let e = (s + size).min(end);
            let constructor = rng.gen::<f64>() < CONSTRUCTOR_PROBABILITY;
            let name =
                naming::disambiguate(&naming::method_name(rng), |n| tree.type_has_member(ty, n));

            tree.add_method(ty, &name, constructor, s, e);
            last_line = e;
            generated += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> VerifierConfig {
        VerifierConfig {
            max_files_per_project: 4,
            max_types_per_file: 4,
            max_fields_per_type: 3,
            max_methods_per_type: 4,
            file_extension: "x".to_string(),
            ..VerifierConfig::default()
        }
    }

    fn assert_layout(tree: &CodeTree) {
        for file in tree.files() {
            assert!(file.length >= 1);
            if file.types.is_empty() {
                assert!(file.length < 3);
                continue;
            }

            let first = tree.type_node(file.types[0]);
            assert_eq!(first.start, 2, "first type must start at line 2");
            let last = tree.type_node(*file.types.last().unwrap());
            assert_eq!(last.end, file.length, "last type must end at file end");

            for pair in file.types.windows(2) {
                let (a, b) = (tree.type_node(pair[0]), tree.type_node(pair[1]));
                assert_eq!(b.start, a.end + 1, "types must be contiguous");
            }

            for &ty in &file.types {
                let node = tree.type_node(ty);
                assert!(node.start < node.end);

                let mut covered = node.start;
                for &field in &node.fields {
                    let line = tree.field(field).line;
                    assert!(line > covered && line <= node.end);
                    covered = line;
                }
                for &method in &node.methods {
                    let m = tree.method(method);
                    assert!(m.start > covered, "methods must not overlap");
                    assert!(m.start <= m.end && m.end <= node.end);
                    covered = m.end;
                }
                assert_eq!(covered, node.end, "members must cover the type");
            }
        }
    }

    #[test]
    fn test_builder_rejects_zero_maximum() {
        let config = VerifierConfig {
            max_methods_per_type: 0,
            ..config()
        };
        assert!(ProjectBuilder::new(&config, SizeProfile::SINGLE).is_err());
    }

    #[test]
    fn test_types_tile_files() {
        let config = config();
        let builder = ProjectBuilder::new(&config, SizeProfile::SINGLE).unwrap();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut tree = CodeTree::new(ROOT_PROJECT);
            let root = tree.root_id();
            builder.populate(&mut tree, root, &mut rng).unwrap();
            assert!(!tree.files().is_empty());
            assert_layout(&tree);
        }
    }

    #[test]
    fn test_undersized_file_gets_fewer_types() {
        let config = config();
        let builder = ProjectBuilder::new(&config, SizeProfile::SINGLE).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut tree = CodeTree::new(ROOT_PROJECT);
        let root = tree.root_id();
        let file = tree.add_file(root, "/tiny/T.x", 5).unwrap();

        builder
            .layout_types(&mut tree, file, "tiny", 5, 10, &mut rng)
            .unwrap();

        let types = &tree.file(file).types;
        assert!(!types.is_empty() && types.len() <= 2);
        assert_layout(&tree);
    }

    #[test]
    fn test_one_line_file_has_no_types() {
        let config = config();
        let builder = ProjectBuilder::new(&config, SizeProfile::SINGLE).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut tree = CodeTree::new(ROOT_PROJECT);
        let root = tree.root_id();
        let file = tree.add_file(root, "/tiny/One.x", 1).unwrap();

        builder
            .layout_types(&mut tree, file, "tiny", 1, 3, &mut rng)
            .unwrap();
        assert!(tree.file(file).types.is_empty());
    }

    /// Random source that always yields zero bits, so every name draw repeats
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    #[test]
    fn test_path_collision_retries_same_slot() {
        let config = VerifierConfig {
            max_namespaces: 1,
            ..config()
        };
        let builder = ProjectBuilder::new(&config, SizeProfile::SINGLE).unwrap();
        let mut rng = StdRng::seed_from_u64(17);

        // replay the draws populate makes up to the first file name
        let mut replay = rng.clone();
        let count = builder.namespaces.sample(&mut replay) as usize;
        let packages = naming::namespace_list(&mut replay, count);
        let sampled_files = builder.files.sample(&mut replay) as usize;
        builder.file_length.sample(&mut replay);
        let first_name = naming::file_name(&mut replay);
        let taken = format!("/{}/{}.x", packages[0].replace('.', "/"), first_name);

        let mut tree = CodeTree::new(ROOT_PROJECT);
        let root = tree.root_id();
        let other = tree.add_sub_project(root, "Project:Other");
        tree.add_file(other, &taken, 2).unwrap();

        builder.populate(&mut tree, root, &mut rng).unwrap();

        let generated = &tree.project(root).files;
        assert_eq!(generated.len(), sampled_files);
        assert!(generated.iter().all(|&f| tree.file(f).path != taken));
        assert_eq!(tree.files().len(), sampled_files + 1);
        assert_layout(&tree);
    }

    #[test]
    fn test_exhausted_name_space_is_config_error() {
        let config = config();
        let builder = ProjectBuilder::new(&config, SizeProfile::SINGLE).unwrap();
        let mut rng = ZeroRng;
        let mut tree = CodeTree::new(ROOT_PROJECT);
        let root = tree.root_id();

        builder
            .generate_file(&mut tree, root, "org.synth.core", &mut rng)
            .unwrap();
        let err = builder
            .generate_file(&mut tree, root, "org.synth.core", &mut rng)
            .unwrap_err();

        assert!(matches!(err, VerifierError::InvalidConfig(ref msg) if msg.contains("256")));
        assert_eq!(tree.files().len(), 1);
    }

    #[test]
    fn test_file_paths_use_package_and_extension() {
        let config = config();
        let builder = ProjectBuilder::new(&config, SizeProfile::SINGLE).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let mut tree = CodeTree::new(ROOT_PROJECT);
        let root = tree.root_id();
        builder.populate(&mut tree, root, &mut rng).unwrap();

        for file in tree.files() {
            assert!(file.path.starts_with('/'));
            assert!(file.path.ends_with(".x"));
            assert!(file.path.contains("/synth/"));
        }
    }
}
