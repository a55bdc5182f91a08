use super::{ProjectBuilder, ProjectGenerator, SizeProfile, ROOT_PROJECT};
use crate::config::VerifierConfig;
use crate::error::Result;
use crate::sampler::Triangular;
use crate::tree::CodeTree;
use rand::RngCore;
use tracing::{debug, info};

/// Generates a root project owning `1..=max_sub_project_depth` sub-projects
///
/// Every sub-project is built with the single-project algorithm directly
/// into the root's arena, so the forest is queryable as one flat tree.
#[derive(Debug, Clone)]
pub struct MultiProjectGenerator<'a> {
    config: &'a VerifierConfig,
}

impl<'a> MultiProjectGenerator<'a> {
    pub fn new(config: &'a VerifierConfig) -> Self {
        MultiProjectGenerator { config }
    }
}

impl ProjectGenerator for MultiProjectGenerator<'_> {
    fn generate(&self, rng: &mut dyn RngCore) -> Result<CodeTree> {
        let builder = ProjectBuilder::new(self.config, SizeProfile::MULTI)?;
        let num_sub_projects =
            Triangular::for_count(self.config.max_sub_project_depth)?.sample(rng);

        let mut tree = CodeTree::new(ROOT_PROJECT);
        let root = tree.root_id();
        for n in 1..=num_sub_projects {
            let identifier = format!("{}:{}", ROOT_PROJECT, n);
            let sub = tree.add_sub_project(root, &identifier);
            builder.populate(&mut tree, sub, rng)?;
            debug!(sub_project = %identifier, "merged sub-project");
        }

        info!(
            sub_projects = num_sub_projects,
            files = tree.files().len(),
            types = tree.types().len(),
            methods = tree.methods().len(),
            "generated multi-project tree"
        );
        Ok(tree)
    }
}
