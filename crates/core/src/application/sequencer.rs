//! JobSequencer - orders a batch by the popularity key in each target name

use crate::application::constants::ORDERING_PREVIEW_LEN;
use crate::domain::Job;
use tracing::info;

/// Return a new ordering of `jobs`, largest key first.
///
/// The sort is stable, so jobs sharing a key keep their enumeration order and
/// unparseable names (key 0) end up last. The input slice is left untouched.
pub fn order_jobs(jobs: &[Job]) -> Vec<Job> {
    let mut keyed: Vec<(f64, &Job)> = jobs.iter().map(|job| (job.ordering_key(), job)).collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.into_iter().map(|(_, job)| job.clone()).collect()
}

/// Log the head of an ordered batch
pub fn log_preview(ordered: &[Job]) {
    info!(total = ordered.len(), "Jobs ordered by popularity (largest first)");
    for (position, job) in ordered.iter().take(ORDERING_PREVIEW_LEN).enumerate() {
        info!(
            position = position + 1,
            job = %job.display_name(),
            key = job.ordering_key(),
            "Queued"
        );
    }
    if ordered.len() > ORDERING_PREVIEW_LEN {
        info!(remaining = ordered.len() - ORDERING_PREVIEW_LEN, "... more jobs queued");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str) -> Job {
        Job::new("face.png", format!("in/{}", name), format!("out/{}", name))
    }

    fn names(jobs: &[Job]) -> Vec<String> {
        jobs.iter().map(|j| j.display_name().into_owned()).collect()
    }

    #[test]
    fn test_orders_descending_with_unparseable_last() {
        let jobs = vec![
            job("random-clip.mp4"),
            job("8500-a.mp4"),
            job("1.2万-b.mp4"),
            job("3千-c.mp4"),
        ];

        let ordered = order_jobs(&jobs);
        assert_eq!(
            names(&ordered),
            vec!["1.2万-b.mp4", "8500-a.mp4", "3千-c.mp4", "random-clip.mp4"]
        );
    }

    #[test]
    fn test_ties_keep_original_order() {
        // 1万 and 10000 share a key
        let jobs = vec![
            job("10000-first.mp4"),
            job("nothing.mp4"),
            job("1万-second.mp4"),
            job("5-small.mp4"),
            job("1.0万-third.mp4"),
        ];

        let ordered = order_jobs(&jobs);
        assert_eq!(
            names(&ordered),
            vec![
                "10000-first.mp4",
                "1万-second.mp4",
                "1.0万-third.mp4",
                "5-small.mp4",
                "nothing.mp4"
            ]
        );
    }

    #[test]
    fn test_output_is_permutation_and_input_untouched() {
        let jobs = vec![job("1-a.mp4"), job("3-b.mp4"), job("2-c.mp4"), job("3-b.mp4")];
        let snapshot = jobs.clone();

        let ordered = order_jobs(&jobs);
        assert_eq!(jobs, snapshot);
        assert_eq!(ordered.len(), jobs.len());

        let mut sorted_in = names(&jobs);
        let mut sorted_out = names(&ordered);
        sorted_in.sort();
        sorted_out.sort();
        assert_eq!(sorted_in, sorted_out);
    }

    #[test]
    fn test_empty_batch() {
        assert!(order_jobs(&[]).is_empty());
    }
}
