use xp_ladder::feed::DemoLadder;
use xp_ladder::leaderboard::{find_current_user, flagged_viewer_count, ranks_are_well_formed};
use xp_ladder::viewer::ViewerProfile;

#[test]
fn demo_boards_are_ranked_and_flag_one_viewer() {
    let mut demo = DemoLadder::seed(ViewerProfile::default());

    for _ in 0..5 {
        let board = demo.next_board().expect("demo source should not fail");

        assert_eq!(board.len(), 8);
        assert!(ranks_are_well_formed(&board));
        assert_eq!(flagged_viewer_count(&board), 1);

        // Ranks track XP: the order handed out is already sorted.
        for pair in board.windows(2) {
            assert!(pair[0].xp >= pair[1].xp);
        }
    }
}

#[test]
fn demo_viewer_falls_back_to_placeholder_identity() {
    let mut demo = DemoLadder::seed(ViewerProfile::default());
    let board = demo.next_board().expect("demo source should not fail");

    let you = find_current_user(&board).expect("viewer entry present");
    assert_eq!(you.id, "demo-you");
    assert_eq!(you.name, "You");
    assert!(you.xp >= 1_500);
}

#[test]
fn demo_viewer_keeps_a_configured_identity() {
    let viewer = ViewerProfile {
        id: "ada-1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        level: 4,
        xp: 2_000,
        total_tasks_completed: 40,
    };
    let mut demo = DemoLadder::seed(viewer);
    let board = demo.next_board().expect("demo source should not fail");

    let you = find_current_user(&board).expect("viewer entry present");
    assert_eq!(you.id, "ada-1");
    assert_eq!(you.name, "Ada");
    assert!(you.xp >= 2_000);
}
