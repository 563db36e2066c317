use core::error::Error;
use core::fmt;
use core::future::Future;
use core::future::IntoFuture;
use core::pin::pin;
use core::task::Context;
use core::task::Poll;

/// The future returned `Pending` on its first poll.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FutureNotReady;

impl fmt::Display for FutureNotReady {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "future was not ready on first poll")
    }
}

impl Error for FutureNotReady {}

/// Polls `fut` exactly once.
pub fn expect_ready<T, F, IF>(fut: IF) -> Result<T, FutureNotReady>
where
    F: Future<Output = T>,
    IF: IntoFuture<IntoFuture = F>,
{
    let waker = fake_waker::new();
    let mut context = Context::from_waker(&waker);

    let fut = pin!(fut.into_future());

    match fut.poll(&mut context) {
        Poll::Ready(v) => Ok(v),
        Poll::Pending => Err(FutureNotReady),
    }
}

mod fake_waker {
    use core::task::RawWaker;
    use core::task::RawWakerVTable;
    use core::task::Waker;

    use log::debug;

    pub(super) fn new() -> Waker {
        // Safety: every vtable entry ignores the data pointer.
        unsafe { Waker::from_raw(new_raw()) }
    }

    fn new_raw() -> RawWaker {
        RawWaker::new(core::ptr::null(), &FAKE_WAKER_VTABLE)
    }

    static FAKE_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(clone, wake, wake_by_ref, drop);

    // A ready future has no reason to keep the waker, so these are logged.
    unsafe fn clone(_: *const ()) -> RawWaker {
        debug!("fake_waker::clone()");
        new_raw()
    }
    unsafe fn wake(_: *const ()) {
        debug!("fake_waker::wake()");
    }
    unsafe fn wake_by_ref(_: *const ()) {
        debug!("fake_waker::wake_by_ref()");
    }
    unsafe fn drop(_: *const ()) {}
}
