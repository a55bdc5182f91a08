use crate::tree::Location;
use serde::Serialize;

/// One rule hit bound to one tree location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub rule: String,
    pub location: Location,
}

impl Finding {
    pub fn new(rule: &str, location: Location) -> Self {
        Finding {
            rule: rule.to_string(),
            location,
        }
    }
}

/// Graph node for a rule that can produce findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingNode {
    rule_name: String,
    findings: Vec<Finding>,
}

impl FindingNode {
    pub fn new(rule_name: &str) -> Self {
        FindingNode {
            rule_name: rule_name.to_string(),
            findings: Vec::new(),
        }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn add_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::CodeTree;
    use crate::tree::LocationKind;

    #[test]
    fn test_attach_findings() {
        let mut tree = CodeTree::new("Project:Test");
        let root = tree.root_id();
        tree.add_file(root, "/a/B.x", 10).unwrap();
        let location = tree.location_at(LocationKind::File, 0).unwrap();

        let mut node = FindingNode::new("LongMethod");
        assert!(node.is_empty());
        node.add_finding(Finding::new("LongMethod", location));
        node.add_finding(Finding::new("LongMethod", location));

        assert_eq!(node.len(), 2);
        assert_eq!(node.findings()[0].location, location);
        assert_eq!(node.rule_name(), "LongMethod");
    }
}
