//! Fixed document layout under `users/{uid}/websites/{websiteId}`.

use super::DocPath;
use crate::Result;

pub fn websites(uid: &str) -> Result<DocPath> {
    DocPath::root("users")?.child(uid)?.child("websites")
}

pub fn website(uid: &str, website_id: &str) -> Result<DocPath> {
    websites(uid)?.child(website_id)
}

pub fn social_state(uid: &str, website_id: &str) -> Result<DocPath> {
    website(uid, website_id)?.child("modules")?.child("social")
}

pub fn geo_runs(uid: &str, website_id: &str) -> Result<DocPath> {
    website(uid, website_id)?.child("geoRuns")
}

pub fn geo_run(uid: &str, website_id: &str, run_id: &str) -> Result<DocPath> {
    geo_runs(uid, website_id)?.child(run_id)
}

pub fn geo_pages(uid: &str, website_id: &str, run_id: &str) -> Result<DocPath> {
    geo_run(uid, website_id, run_id)?.child("pages")
}
