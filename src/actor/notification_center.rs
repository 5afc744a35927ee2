//! Forwards workspace notifications that mean the active desktop or the set
//! of desktops may have changed.

use objc2::rc::{Allocated, Retained};
use objc2::{AnyThread, DeclaredClass, Encode, Encoding, define_class, msg_send, sel};
use objc2_app_kit::{
    NSWorkspace, NSWorkspaceActiveSpaceDidChangeNotification, NSWorkspaceDidWakeNotification,
};
use objc2_foundation::{NSNotification, NSObject, NSString};
use tracing::{debug_span, trace};

use super::navigator::{self, Event};

#[repr(C)]
struct Instance {
    events_tx: navigator::Sender,
}

unsafe impl Encode for Instance {
    const ENCODING: Encoding = Encoding::Object;
}

define_class! {
    // SAFETY:
    // - The superclass NSObject does not have any subclassing requirements.
    // - `SpacesObserver` does not implement `Drop`.
    #[unsafe(super(NSObject))]
    #[ivars = Box<Instance>]
    struct SpacesObserver;

    // SAFETY: Each of these method signatures must match their invocations.
    impl SpacesObserver {
        #[unsafe(method_id(initWith:))]
        fn init(this: Allocated<Self>, instance: Instance) -> Option<Retained<Self>> {
            let this = this.set_ivars(Box::new(instance));
            unsafe { msg_send![super(this), init] }
        }

        #[unsafe(method(recvSpacesChanged:))]
        fn recv_spaces_changed(&self, notif: &NSNotification) {
            let name = notif.name();
            let span = debug_span!("notification_center::recv_spaces_changed", %name);
            let _s = span.enter();
            trace!("{notif:#?}");
            self.ivars().events_tx.send(Event::SpacesChanged);
        }
    }
}

impl SpacesObserver {
    fn new(events_tx: navigator::Sender) -> Retained<Self> {
        let instance = Instance { events_tx };
        unsafe { msg_send![Self::alloc(), initWith: instance] }
    }
}

/// Keeps the observer registered for as long as it lives. Must be created on
/// the main thread, whose run loop delivers the notifications.
pub struct NotificationCenter {
    _observer: Retained<SpacesObserver>,
}

impl NotificationCenter {
    pub fn new(events_tx: navigator::Sender) -> Self {
        let observer = SpacesObserver::new(events_tx);
        let workspace = &NSWorkspace::sharedWorkspace();
        let center = &workspace.notificationCenter();
        // SAFETY: `recvSpacesChanged:` has signature fn(&self, &NSNotification).
        unsafe {
            center.addObserver_selector_name_object(
                &observer,
                sel!(recvSpacesChanged:),
                Some(NSWorkspaceActiveSpaceDidChangeNotification),
                Some(workspace),
            );
            center.addObserver_selector_name_object(
                &observer,
                sel!(recvSpacesChanged:),
                Some(&NSString::from_str("NSWorkspaceActiveDisplayDidChangeNotification")),
                Some(workspace),
            );
            // Desktops can be rearranged while asleep.
            center.addObserver_selector_name_object(
                &observer,
                sel!(recvSpacesChanged:),
                Some(NSWorkspaceDidWakeNotification),
                Some(workspace),
            );
        }
        NotificationCenter { _observer: observer }
    }
}
