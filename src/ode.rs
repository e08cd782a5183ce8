use std::fmt;
use std::os::raw::c_uint;
use std::rc::Rc;

use log::debug;

use crate::backend::NativeApi;
use crate::ffi;
use crate::Result;

/// Initialized library state, shared by every handle created from it.
///
/// The library is closed once the last reference goes away, so no handle can
/// outlive it.
pub(crate) struct Context {
    api: Rc<dyn NativeApi>,
}

impl Context {
    pub(crate) fn api(&self) -> &dyn NativeApi {
        &*self.api
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        debug!("Closing ODE");
        unsafe { self.api.close() }
    }
}

/// ODE library builder.
#[derive(Default)]
pub struct OdeConfig {
    flags: c_uint,
    api: Option<Rc<dyn NativeApi>>,
}

impl OdeConfig {
    /// Threads other than the initializing one release their ODE data manually.
    pub fn manual_thread_cleanup(mut self) -> Self {
        self.flags |= ffi::dInitFlagManualThreadCleanup;
        self
    }

    /// Routes native calls through `api` instead of the default backend.
    pub fn backend<A: NativeApi + 'static>(mut self, api: Rc<A>) -> Self {
        let api: Rc<dyn NativeApi> = api;
        self.api = Some(api);
        self
    }

    pub fn build(self) -> Result<Ode> {
        let api = match self.api {
            Some(api) => api,
            None => default_backend()?,
        };

        api.init(self.flags)?;
        debug!("Initialized ODE (flags = {:#x})", self.flags);

        Ok(Ode {
            context: Rc::new(Context { api }),
        })
    }
}

#[cfg(feature = "native")]
fn default_backend() -> Result<Rc<dyn NativeApi>> {
    let api: Rc<dyn NativeApi> = Rc::new(crate::backend::native::NativeOde);
    Ok(api)
}

#[cfg(not(feature = "native"))]
fn default_backend() -> Result<Rc<dyn NativeApi>> {
    Err(crate::error::Error::NoBackend)
}

/// Handle to the initialized ODE library.
pub struct Ode {
    context: Rc<Context>,
}

impl Ode {
    /// Initializes the library with the default configuration.
    pub fn create() -> Result<Self> {
        Self::config().build()
    }

    pub fn config() -> OdeConfig {
        OdeConfig::default()
    }

    pub fn api(&self) -> &dyn NativeApi {
        self.context.api()
    }

    pub(crate) fn context(&self) -> Rc<Context> {
        Rc::clone(&self.context)
    }
}

impl fmt::Debug for Ode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Ode")
            .field("handles", &(Rc::strong_count(&self.context) - 1))
            .finish()
    }
}
