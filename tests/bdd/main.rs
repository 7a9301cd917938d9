// BDD runner for the enrollment feature files

mod steps;

use cucumber::World;
use groupsetup_monitoring::logging::init_test_tracing;
use groupsetup_tests::features_dir;
use steps::world::EnrollmentWorld;

#[tokio::main]
async fn main() {
    init_test_tracing();

    EnrollmentWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit(features_dir())
        .await;
}
