use domain::{Module, Node, StaffContext};

#[test]
fn staff_context_builds() {
    let ctx = StaffContext::new("uid-1", "staff@example.com", true);

    assert_eq!(ctx.uid, "uid-1");
    assert_eq!(ctx.email, "staff@example.com");
    assert!(ctx.is_admin);
}

#[test]
fn node_parses_case_insensitively() {
    assert_eq!("Entrance".parse::<Node>(), Ok(Node::Entrance));
    assert_eq!("exit".parse::<Node>(), Ok(Node::Exit));
    assert!("lobby".parse::<Node>().is_err());
}

#[test]
fn module_paths_are_lower_case() {
    assert_eq!(Module::Controller.path(Node::Entrance), "entrance/controller");
    assert_eq!(Module::State.command_path(Node::Exit), "exit/state/command");
    assert_eq!(Module::Alpr.command_path(Node::Entrance), "entrance/alpr/command");
}
