use super::{ProjectBuilder, ProjectGenerator, SizeProfile, ROOT_PROJECT};
use crate::config::VerifierConfig;
use crate::error::Result;
use crate::tree::CodeTree;
use rand::RngCore;
use tracing::info;

/// Generates one project rooted at `Project:Test`
#[derive(Debug, Clone)]
pub struct SimpleProjectGenerator<'a> {
    config: &'a VerifierConfig,
}

impl<'a> SimpleProjectGenerator<'a> {
    pub fn new(config: &'a VerifierConfig) -> Self {
        SimpleProjectGenerator { config }
    }
}

impl ProjectGenerator for SimpleProjectGenerator<'_> {
    fn generate(&self, rng: &mut dyn RngCore) -> Result<CodeTree> {
        let builder = ProjectBuilder::new(self.config, SizeProfile::SINGLE)?;
        let mut tree = CodeTree::new(ROOT_PROJECT);
        let root = tree.root_id();
        builder.populate(&mut tree, root, rng)?;

        info!(
            files = tree.files().len(),
            types = tree.types().len(),
            methods = tree.methods().len(),
            "generated single-project tree"
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_single_project_has_no_sub_projects() {
        let config = VerifierConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let tree = SimpleProjectGenerator::new(&config)
            .generate(&mut rng)
            .unwrap();

        assert_eq!(tree.root().identifier, ROOT_PROJECT);
        assert!(tree.root().sub_projects.is_empty());
        assert_eq!(tree.root().files.len(), tree.files().len());
    }

    #[test]
    fn test_file_lengths_follow_single_profile() {
        let config = VerifierConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let tree = SimpleProjectGenerator::new(&config)
            .generate(&mut rng)
            .unwrap();

        assert!(tree
            .files()
            .iter()
            .all(|f| (300..=3000).contains(&f.length)));
    }

    #[test]
    fn test_fixed_seed_reproduces_tree() {
        let config = VerifierConfig::default();
        let generate = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            SimpleProjectGenerator::new(&config)
                .generate(&mut rng)
                .unwrap()
        };

        let (a, b) = (generate(17), generate(17));
        let paths = |t: &CodeTree| t.files().iter().map(|f| f.path.clone()).collect::<Vec<_>>();
        assert_eq!(paths(&a), paths(&b));
        assert_eq!(a.methods().len(), b.methods().len());
        assert_eq!(
            a.methods().iter().map(|m| (m.start, m.end)).collect::<Vec<_>>(),
            b.methods().iter().map(|m| (m.start, m.end)).collect::<Vec<_>>()
        );
    }
}
