#![allow(clippy::missing_safety_doc)]

use std::ffi::c_void;
use std::ptr;

use thiserror::Error;

pub type OSStatus = i32;
pub type EventHandlerCallRef = *mut c_void;
pub type EventHandlerRef = *mut c_void;
pub type EventHotKeyRef = *mut c_void;
pub type EventRef = *mut c_void;
pub type EventTargetRef = *mut c_void;

pub const NO_ERR: OSStatus = 0;

pub const K_EVENT_CLASS_KEYBOARD: u32 = 1_801_812_322; // 'keyb'
pub const K_EVENT_HOT_KEY_PRESSED: u32 = 5;
pub const K_EVENT_PARAM_DIRECT_OBJECT: u32 = 757_935_405; // '----'
pub const TYPE_EVENT_HOT_KEY_ID: u32 = 1_751_869_796; // 'hkid'

#[allow(non_snake_case)]
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct EventType {
    pub eventClass: u32,
    pub eventKind: u32,
}

pub const fn event_type(event_class: u32, event_kind: u32) -> EventType {
    EventType {
        eventClass: event_class,
        eventKind: event_kind,
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventHotKeyId {
    pub signature: u32,
    pub id: u32,
}

#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("GetApplicationEventTarget returned null")]
    NoApplicationTarget,
    #[error("InstallEventHandler failed: status={0}")]
    InstallHandler(OSStatus),
    #[error("RemoveEventHandler failed: status={0}")]
    RemoveHandler(OSStatus),
    #[error("RegisterEventHotKey failed for keycode {keycode}: status={status}")]
    RegisterHotKey { keycode: u16, status: OSStatus },
}

#[link(name = "Carbon", kind = "framework")]
unsafe extern "C" {
    fn GetApplicationEventTarget() -> EventTargetRef;

    fn InstallEventHandler(
        target: EventTargetRef,
        handler: Option<
            unsafe extern "C" fn(EventHandlerCallRef, EventRef, *mut c_void) -> OSStatus,
        >,
        num_types: u32,
        type_list: *const EventType,
        user_data: *mut c_void,
        out_ref: *mut EventHandlerRef,
    ) -> OSStatus;

    fn RemoveEventHandler(handler: EventHandlerRef) -> OSStatus;

    fn RegisterEventHotKey(
        key_code: u32,
        modifiers: u32,
        id: EventHotKeyId,
        target: EventTargetRef,
        options: u32,
        out_ref: *mut EventHotKeyRef,
    ) -> OSStatus;

    fn UnregisterEventHotKey(hot_key: EventHotKeyRef) -> OSStatus;

    fn GetEventParameter(
        event: EventRef,
        name: u32,
        desired_type: u32,
        actual_type: *mut u32,
        buffer_size: u32,
        actual_size: *mut u32,
        data: *mut c_void,
    ) -> OSStatus;
}

fn application_target() -> Result<EventTargetRef, CarbonError> {
    let target = unsafe { GetApplicationEventTarget() };
    if target.is_null() {
        Err(CarbonError::NoApplicationTarget)
    } else {
        Ok(target)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub raw: EventRef,
}

impl Event {
    pub unsafe fn parameter<T: Copy>(&self, name: u32, desired_type: u32) -> Option<T> {
        let mut out: T = unsafe { std::mem::zeroed() };
        let status = unsafe {
            GetEventParameter(
                self.raw,
                name,
                desired_type,
                std::ptr::null_mut(),
                std::mem::size_of::<T>() as u32,
                std::ptr::null_mut(),
                &mut out as *mut T as *mut c_void,
            )
        };
        if status == NO_ERR { Some(out) } else { None }
    }

    pub fn hot_key_id(&self) -> Option<EventHotKeyId> {
        unsafe { self.parameter(K_EVENT_PARAM_DIRECT_OBJECT, TYPE_EVENT_HOT_KEY_ID) }
    }
}

struct CallbackCtx {
    inner: Box<dyn FnMut(Event) -> OSStatus + Send>,
}

unsafe extern "C" fn trampoline(
    _call_ref: EventHandlerCallRef,
    event: EventRef,
    user_data: *mut c_void,
) -> OSStatus {
    let ctx = unsafe { &mut *(user_data as *mut CallbackCtx) };
    (ctx.inner)(Event { raw: event })
}

/// A Carbon event handler installed on the application target.
pub struct CarbonListener {
    handler_ref: EventHandlerRef,
    ctx: *mut c_void,
}

// SAFETY: The handler and its context are only touched by the constructor
// and by `remove`, and Carbon delivers events on the main run loop.
unsafe impl Send for CarbonListener {}

impl std::fmt::Debug for CarbonListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarbonListener")
            .field("handler_ref", &self.handler_ref)
            .finish()
    }
}

impl CarbonListener {
    pub fn application<F>(types: &[EventType], callback: F) -> Result<Self, CarbonError>
    where
        F: FnMut(Event) -> OSStatus + Send + 'static,
    {
        let target = application_target()?;
        let ctx = Box::into_raw(Box::new(CallbackCtx { inner: Box::new(callback) })) as *mut c_void;

        let mut handler_ref: EventHandlerRef = ptr::null_mut();
        let status = unsafe {
            InstallEventHandler(
                target,
                Some(trampoline),
                types.len() as u32,
                types.as_ptr(),
                ctx,
                &mut handler_ref,
            )
        };

        if status != NO_ERR || handler_ref.is_null() {
            unsafe { drop(Box::from_raw(ctx as *mut CallbackCtx)) };
            return Err(CarbonError::InstallHandler(status));
        }

        Ok(Self { handler_ref, ctx })
    }

    pub fn remove(&mut self) -> Result<(), CarbonError> {
        if !self.handler_ref.is_null() {
            let status = unsafe { RemoveEventHandler(self.handler_ref) };
            if status != NO_ERR {
                return Err(CarbonError::RemoveHandler(status));
            }
            self.handler_ref = ptr::null_mut();
        }
        if !self.ctx.is_null() {
            unsafe { drop(Box::from_raw(self.ctx as *mut CallbackCtx)) };
            self.ctx = ptr::null_mut();
        }
        Ok(())
    }
}

impl Drop for CarbonListener {
    fn drop(&mut self) {
        let _ = self.remove();
    }
}

/// A system-wide hotkey, unregistered on drop.
#[derive(Debug)]
pub struct RegisteredHotKey {
    hot_key_ref: EventHotKeyRef,
}

// SAFETY: The ref is an opaque token passed back to Carbon on drop.
unsafe impl Send for RegisteredHotKey {}

impl RegisteredHotKey {
    pub fn register(
        keycode: u16,
        carbon_modifiers: u32,
        id: EventHotKeyId,
    ) -> Result<Self, CarbonError> {
        let target = application_target()?;
        let mut hot_key_ref: EventHotKeyRef = ptr::null_mut();
        let status = unsafe {
            RegisterEventHotKey(
                u32::from(keycode),
                carbon_modifiers,
                id,
                target,
                0,
                &mut hot_key_ref,
            )
        };
        if status != NO_ERR || hot_key_ref.is_null() {
            return Err(CarbonError::RegisterHotKey { keycode, status });
        }
        Ok(Self { hot_key_ref })
    }
}

impl Drop for RegisteredHotKey {
    fn drop(&mut self) {
        unsafe { UnregisterEventHotKey(self.hot_key_ref) };
    }
}
