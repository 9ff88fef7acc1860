// Batch input validation and video discovery

use crate::application::constants::{BATCH_OUTPUT_EXTENSION, BATCH_OUTPUT_SUFFIX};
use crate::domain::media::{is_batch_video, is_image};
use crate::domain::Job;
use crate::error::{AppError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Fail fast on a bad source image or input directory
pub async fn validate_inputs(source: &Path, input_dir: &Path) -> Result<()> {
    match tokio::fs::metadata(source).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            return Err(AppError::Validation(format!(
                "source image not found: {}",
                source.display()
            )))
        }
    }
    if !is_image(source) {
        return Err(AppError::Validation(format!(
            "source is not a supported image: {}",
            source.display()
        )));
    }
    match tokio::fs::metadata(input_dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "input directory not found: {}",
            input_dir.display()
        ))),
    }
}

/// Enumerate video jobs under `input_dir`, duplicate-free and in path order.
///
/// Destinations mirror the input tree under `output_dir` as `<stem>-swapped.mp4`.
/// When `output_dir` sits strictly inside `input_dir`, its contents are skipped.
pub async fn discover_jobs(
    source: &Path,
    input_dir: &Path,
    output_dir: &Path,
    recursive: bool,
) -> Result<Vec<Job>> {
    let input_root = tokio::fs::canonicalize(input_dir).await?;
    let output_root = tokio::fs::canonicalize(output_dir)
        .await
        .unwrap_or_else(|_| output_dir.to_path_buf());
    let excluded = (output_root != input_root && output_root.starts_with(&input_root))
        .then_some(output_root.as_path());
    let in_output = |path: &Path| excluded.is_some_and(|root| path.starts_with(root));

    let mut found = BTreeSet::new();
    let mut pending = vec![input_root.clone()];
    while let Some(dir) = pending.pop() {
        if in_output(&dir) {
            continue;
        }
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if is_batch_video(&path) && !in_output(&path) {
                found.insert(path);
            }
        }
    }

    Ok(found
        .into_iter()
        .map(|target| {
            let destination = destination_for(&input_root, output_dir, &target);
            Job::new(source, target, destination)
        })
        .collect())
}

fn destination_for(input_root: &Path, output_dir: &Path, target: &Path) -> PathBuf {
    let relative = target.strip_prefix(input_root).unwrap_or(target);
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}{}.{}", stem, BATCH_OUTPUT_SUFFIX, BATCH_OUTPUT_EXTENSION);
    match relative.parent() {
        Some(parent) => output_dir.join(parent).join(file_name),
        None => output_dir.join(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn target_names(jobs: &[Job]) -> Vec<String> {
        jobs.iter().map(|j| j.display_name().into_owned()).collect()
    }

    #[tokio::test]
    async fn test_recursive_discovery_mirrors_tree() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        touch(&input.join("a.mp4"));
        touch(&input.join("nested/b.MKV"));
        touch(&input.join("notes.txt"));

        let jobs = discover_jobs(Path::new("face.png"), &input, &output, true)
            .await
            .unwrap();

        assert_eq!(target_names(&jobs), vec!["a.mp4", "b.MKV"]);
        assert_eq!(jobs[0].destination, output.join("a-swapped.mp4"));
        assert_eq!(jobs[1].destination, output.join("nested").join("b-swapped.mp4"));
    }

    #[tokio::test]
    async fn test_top_level_only_when_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("top.mov"));
        touch(&dir.path().join("sub/deep.mov"));

        let jobs = discover_jobs(Path::new("f.png"), dir.path(), &dir.path().join("out"), false)
            .await
            .unwrap();
        assert_eq!(target_names(&jobs), vec!["top.mov"]);
    }

    #[tokio::test]
    async fn test_nested_output_dir_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path();
        let output = input.join("in-swapped");
        touch(&input.join("clip.mp4"));
        touch(&output.join("clip-swapped.mp4"));

        let jobs = discover_jobs(Path::new("f.png"), input, &output, true)
            .await
            .unwrap();
        assert_eq!(target_names(&jobs), vec!["clip.mp4"]);
    }

    #[tokio::test]
    async fn test_output_equal_to_input_keeps_every_video() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("videos");
        touch(&input.join("8500-a.mp4"));

        let jobs = discover_jobs(Path::new("f.png"), &input, &input, true)
            .await
            .unwrap();
        assert_eq!(target_names(&jobs), vec!["8500-a.mp4"]);
        assert_eq!(jobs[0].destination, input.join("8500-a-swapped.mp4"));
    }

    #[tokio::test]
    async fn test_output_above_input_keeps_every_video() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("videos");
        touch(&input.join("8500-a.mp4"));
        touch(&input.join("nested/b.mov"));

        let jobs = discover_jobs(Path::new("f.png"), &input, dir.path(), true)
            .await
            .unwrap();
        assert_eq!(target_names(&jobs), vec!["8500-a.mp4", "b.mov"]);
        assert_eq!(jobs[1].destination, dir.path().join("nested").join("b-swapped.mp4"));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let face = dir.path().join("face.png");
        let not_image = dir.path().join("face.txt");
        touch(&face);
        touch(&not_image);

        assert!(validate_inputs(&face, dir.path()).await.is_ok());
        assert!(matches!(
            validate_inputs(&dir.path().join("missing.png"), dir.path()).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_inputs(&not_image, dir.path()).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_inputs(&face, &dir.path().join("nope")).await,
            Err(AppError::Validation(_))
        ));
    }
}
