//! File-backed course store: every `*.yaml` / `*.yml` file under a directory is one course

use super::{block_usage_id, usage_id, ContentResolver};
use crate::models::{
    Block, BlockCategory, BlockSpec, Course, CourseFile, DeclaredKinds, ProblemData, ResolveError,
    Revision,
};
use crate::parser::classify_markup;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Version token of markup without an explicit version: `sha256:<hex>`
pub fn markup_version(markup: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(markup.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

/// In-memory course trees loaded from course files
#[derive(Debug, Default)]
pub struct CourseStore {
    courses: Vec<Course>,
    blocks: HashMap<String, Block>,
}

impl CourseStore {
    /// Load every course file under `dir`, in path order
    pub fn load(dir: &Path) -> Result<Self, ResolveError> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(|e| ResolveError::Io(e.into()))?;
            let is_yaml = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if entry.file_type().is_file() && is_yaml {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        let mut store = Self::default();
        for path in &paths {
            store.add_course_file(path)?;
        }
        tracing::info!(
            courses = store.courses.len(),
            blocks = store.blocks.len(),
            "Loaded course store from {}",
            dir.display()
        );
        Ok(store)
    }

    /// Parse and add one course file
    pub fn add_course_file(&mut self, path: &Path) -> Result<(), ResolveError> {
        let content = std::fs::read_to_string(path)?;
        let course: CourseFile = serde_yaml::from_str(&content).map_err(|e| ResolveError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.add_course(course, base_dir)
    }

    /// Add a parsed course; `base_dir` anchors relative `data_file` paths
    pub fn add_course(&mut self, course: CourseFile, base_dir: &Path) -> Result<(), ResolveError> {
        let root = usage_id(&course.course)?;
        if self.blocks.contains_key(&root) {
            return Err(ResolveError::DuplicateId(root));
        }

        let mut children = Vec::with_capacity(course.children.len());
        for child in course.children {
            children.push(self.insert_block(&course.course, child, base_dir)?);
        }

        self.blocks.insert(
            root.clone(),
            Block {
                usage_id: root.clone(),
                category: BlockCategory::Course,
                display_name: course.display_name.clone(),
                children,
                problem: None,
            },
        );
        self.courses.push(Course {
            key: course.course,
            root,
            display_name: course.display_name,
            start: course.start,
            end: course.end,
        });
        Ok(())
    }

    fn insert_block(
        &mut self,
        course_key: &str,
        spec: BlockSpec,
        base_dir: &Path,
    ) -> Result<String, ResolveError> {
        let id = block_usage_id(course_key, spec.category.as_str(), &spec.id)?;
        if self.blocks.contains_key(&id) {
            return Err(ResolveError::DuplicateId(id));
        }

        let problem = match spec.category {
            BlockCategory::Problem => Some(load_problem(&id, &spec, base_dir)?),
            _ => None,
        };

        let mut children = Vec::with_capacity(spec.children.len());
        for child in spec.children {
            children.push(self.insert_block(course_key, child, base_dir)?);
        }

        self.blocks.insert(
            id.clone(),
            Block {
                usage_id: id.clone(),
                category: spec.category,
                display_name: spec.display_name,
                children,
                problem,
            },
        );
        Ok(id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl ContentResolver for CourseStore {
    fn block(&self, id: &str) -> Result<&Block, ResolveError> {
        let key = usage_id(id)?;
        self.blocks.get(&key).ok_or(ResolveError::NotFound(key))
    }

    fn courses(&self) -> Vec<&Course> {
        self.courses.iter().collect()
    }
}

fn load_problem(id: &str, spec: &BlockSpec, base_dir: &Path) -> Result<ProblemData, ResolveError> {
    let markup = read_markup(id, spec.data.as_deref(), spec.data_file.as_deref(), base_dir)?;

    let kinds = declared_kinds(id, spec, &markup);

    let mut revisions = Vec::with_capacity(spec.revisions.len());
    for revision in &spec.revisions {
        let markup = read_markup(
            id,
            revision.data.as_deref(),
            revision.data_file.as_deref(),
            base_dir,
        )?;
        revisions.push(Revision {
            version: revision.version.clone(),
            kinds: declared_kinds(id, spec, &markup),
            markup,
        });
    }

    Ok(ProblemData {
        version: spec.version.clone().unwrap_or_else(|| markup_version(&markup)),
        markup,
        kinds,
        revisions,
    })
}

/// Declared `problem_types`, else the kinds found in `markup`
fn declared_kinds(id: &str, spec: &BlockSpec, markup: &str) -> DeclaredKinds {
    match &spec.problem_types {
        Some(types) => DeclaredKinds::from_tags(types.iter().cloned()),
        None => classify_markup(markup).unwrap_or_else(|e| {
            tracing::warn!(problem = %id, "Cannot classify problem markup: {}", e);
            DeclaredKinds::None
        }),
    }
}

fn read_markup(
    id: &str,
    data: Option<&str>,
    data_file: Option<&Path>,
    base_dir: &Path,
) -> Result<String, ResolveError> {
    match (data, data_file) {
        (Some(data), _) => Ok(data.to_string()),
        (None, Some(file)) => Ok(std::fs::read_to_string(base_dir.join(file))?),
        (None, None) => Err(ResolveError::Parse {
            path: id.to_string(),
            message: "problem has neither data nor data_file".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::descendants;
    use tempfile::TempDir;

    const COURSE: &str = r#"
course: "course-v1:Org+CS101+2024"
display_name: Intro
start: 2024-01-01
end: 2099-12-31
children:
  - id: week1
    category: chapter
    display_name: Week 1
    children:
      - id: seq1
        category: sequential
        display_name: Quiz 1
        children:
          - id: p1
            category: problem
            display_name: Capital
            version: v2
            data: '<problem><stringresponse answer="Paris"><textline/></stringresponse></problem>'
            revisions:
              - version: v1
                data: '<problem><stringresponse answer="paris"><textline/></stringresponse></problem>'
          - id: p2
            category: problem
            data_file: problems/p2.xml
"#;

    fn store() -> (TempDir, CourseStore) {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("problems")).unwrap();
        std::fs::write(
            temp.path().join("problems/p2.xml"),
            r#"<problem><choiceresponse><checkboxgroup><choice correct="true">a</choice></checkboxgroup></choiceresponse></problem>"#,
        )
        .unwrap();
        std::fs::write(temp.path().join("intro.yaml"), COURSE).unwrap();
        std::fs::write(temp.path().join("notes.txt"), "ignored").unwrap();
        let store = CourseStore::load(temp.path()).unwrap();
        (temp, store)
    }

    #[test]
    fn test_load_course_tree() {
        let (_temp, store) = store();
        assert_eq!(store.courses().len(), 1);
        assert_eq!(store.block_count(), 5);

        let blocks = descendants(&store, "course-v1:Org+CS101+2024").unwrap();
        let categories: Vec<BlockCategory> = blocks.iter().map(|b| b.category).collect();
        assert_eq!(
            categories,
            vec![
                BlockCategory::Course,
                BlockCategory::Chapter,
                BlockCategory::Sequential,
                BlockCategory::Problem,
                BlockCategory::Problem
            ]
        );
    }

    #[test]
    fn test_problem_kinds_classified_from_markup() {
        let (_temp, store) = store();
        let p2 = store
            .block("block-v1:Org+CS101+2024+type@problem+block@p2")
            .unwrap();
        assert_eq!(p2.kinds(), Some(&DeclaredKinds::Single("choiceresponse".to_string())));
        assert!(p2.problem.as_ref().unwrap().version.starts_with("sha256:"));
    }

    #[test]
    fn test_resolve_versions() {
        let (_temp, store) = store();
        let id = "block-v1:Org+CS101+2024+type@problem+block@p1";

        let current = store.resolve(id, None).unwrap();
        assert_eq!(current.version, "v2");
        assert!(current.markup.contains("Paris"));

        let old = store.resolve(id, Some("v1")).unwrap();
        assert_eq!(old.version, "v1");
        assert!(old.markup.contains("paris"));

        assert!(matches!(
            store.resolve(id, Some("v0")),
            Err(ResolveError::UnknownVersion { .. })
        ));
    }

    #[test]
    fn test_revision_kinds_classified_from_revision_markup() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("rev.yaml"),
            r#"
course: "course-v1:Org+Rev+1"
display_name: Rev
children:
  - id: p
    category: problem
    version: v2
    data: '<problem><stringresponse answer="a"><textline/></stringresponse></problem>'
    revisions:
      - version: v1
        data: '<problem><choiceresponse><checkboxgroup><choice correct="true">a</choice></checkboxgroup></choiceresponse></problem>'
"#,
        )
        .unwrap();
        let store = CourseStore::load(temp.path()).unwrap();
        let id = "block-v1:Org+Rev+1+type@problem+block@p";

        let current = store.resolve(id, None).unwrap();
        assert_eq!(current.kinds, DeclaredKinds::Single("stringresponse".to_string()));
        let old = store.resolve(id, Some("v1")).unwrap();
        assert_eq!(old.kinds, DeclaredKinds::Single("choiceresponse".to_string()));
    }

    #[test]
    fn test_resolve_failures() {
        let (_temp, store) = store();
        assert!(matches!(
            store.resolve("block-v1:Org+CS101+2024+type@problem+block@nope", None),
            Err(ResolveError::NotFound(_))
        ));
        assert!(matches!(store.resolve("garbage", None), Err(ResolveError::InvalidId(_))));
        assert!(matches!(
            store.resolve("course-v1:Org+CS101+2024", None),
            Err(ResolveError::NotAProblem(_))
        ));
    }

    #[test]
    fn test_children() {
        let (_temp, store) = store();
        let children = store
            .children("block-v1:Org+CS101+2024+type@sequential+block@seq1")
            .unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[0].ends_with("block@p1"));
    }

    #[test]
    fn test_duplicate_block_ids_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("dup.yaml"),
            r#"
course: "course-v1:Org+Dup+1"
display_name: Dup
children:
  - id: a
    category: chapter
  - id: a
    category: chapter
"#,
        )
        .unwrap();
        assert!(matches!(
            CourseStore::load(temp.path()),
            Err(ResolveError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_markup_version_is_stable() {
        assert_eq!(markup_version("<problem/>"), markup_version("<problem/>"));
        assert_ne!(markup_version("<problem/>"), markup_version("<problem />"));
    }
}
