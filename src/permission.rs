// Camera permission gate. Fire-and-forget: the answer is only logged, a
// denied camera surfaces later as a source error.

#[cfg(feature = "camera")]
pub fn request_camera_access() {
    log::info!("Requesting camera access from the OS...");
    nokhwa::nokhwa_initialize(|granted| {
        if granted {
            log::info!("Camera access granted.");
        } else {
            log::warn!("Camera access denied; the camera source will fail to open.");
        }
    });
}

#[cfg(not(feature = "camera"))]
pub fn request_camera_access() {
    log::debug!("Built without camera support, no OS permission to request.");
}
