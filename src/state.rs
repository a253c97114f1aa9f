// Represents the current high-level state of the application UI
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    Initialising, // App is starting, requesting camera access, spawning the source
    Running,      // Scan screen with live feed and verdict banner
    About,        // Showing the about screen
}
